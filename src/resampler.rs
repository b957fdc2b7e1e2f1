use std::collections::BTreeMap;
use chrono::{FixedOffset, NaiveDateTime, NaiveTime, TimeDelta};
use crate::config::ResamplerParameters;
use crate::models::forecast::{DailyValues, TimeValues};

/// Length of one daily window in milliseconds
const DAY_MS: i64 = 86_400_000;

/// Aggregates a forecast time series into daily min/max windows on local time.
///
/// Windows end at a local cutoff time of day and are right closed and right labeled, i.e. with
/// an 08:45 cutoff the window (08:45 day N, 08:45 day N+1] is labeled day N+1. This follows how
/// observed daily min/max temperatures are reported, so forecasted and observed days line up.
pub struct Resampler {
    utc_offset: FixedOffset,
    cutoff: NaiveTime,
    skip_windows: usize,
    max_days: usize,
}

impl Resampler {
    /// Returns a Resampler
    ///
    /// # Arguments
    ///
    /// * 'params' - local time zone, cutoff time and window counts
    pub fn new(params: &ResamplerParameters) -> Resampler {
        Resampler {
            utc_offset: params.utc_offset,
            cutoff: params.cutoff,
            skip_windows: params.skip_windows,
            max_days: params.max_days,
        }
    }

    /// Returns daily min/max for the windows following the discarded leading ones, at most
    /// `max_days` of them. Values are rounded to 2 decimals.
    ///
    /// Too short a series gives fewer windows, possibly none.
    ///
    /// # Arguments
    ///
    /// * 'series' - forecast time series for one station
    pub fn resample(&self, series: &[TimeValues]) -> Vec<DailyValues> {
        self.raw_windows(series)
            .into_iter()
            .skip(self.skip_windows)
            .take(self.max_days)
            .map(|d| DailyValues { date: d.date, min: d.min.map(round2), max: d.max.map(round2) })
            .collect()
    }

    /// Returns every window from the first to the last one holding a reading, windows in between
    /// without any valid reading get None for min and max.
    ///
    /// Windows are anchored at the cutoff time on the local date of the earliest reading.
    ///
    /// # Arguments
    ///
    /// * 'series' - forecast time series for one station
    fn raw_windows(&self, series: &[TimeValues]) -> Vec<DailyValues> {
        let local_times = series
            .iter()
            .map(|v| (v.valid_time.with_timezone(&self.utc_offset).naive_local(), v.temp))
            .collect::<Vec<(NaiveDateTime, Option<f64>)>>();

        let Some(first) = local_times.iter().map(|(t, _)| *t).min() else {
            return Vec::new();
        };
        let anchor = first.date().and_time(self.cutoff);

        let mut windows: BTreeMap<i64, (Option<f64>, Option<f64>)> = BTreeMap::new();
        for (local_time, temp) in local_times {
            let entry = windows.entry(window_index(anchor, local_time)).or_insert((None, None));
            if let Some(t) = temp.filter(|t| !t.is_nan()) {
                entry.0 = Some(entry.0.map_or(t, |m| m.min(t)));
                entry.1 = Some(entry.1.map_or(t, |m| m.max(t)));
            }
        }

        let (Some(&start), Some(&end)) = (windows.keys().next(), windows.keys().next_back()) else {
            return Vec::new();
        };

        (start..=end)
            .map(|k| {
                let (min, max) = windows.get(&k).copied().unwrap_or((None, None));
                DailyValues { date: anchor.date() + TimeDelta::days(k), min, max }
            })
            .collect()
    }
}

/// Returns the index of the right closed daily window holding the given local time, window k
/// being (anchor + (k - 1) days, anchor + k days]
///
/// # Arguments
///
/// * 'anchor' - the right edge of window 0
/// * 'local_time' - local time of a reading
fn window_index(anchor: NaiveDateTime, local_time: NaiveDateTime) -> i64 {
    let diff = (local_time - anchor).num_milliseconds();
    -(-diff).div_euclid(DAY_MS)
}

/// Rounds to 2 decimals by scaling by 100, rounding ties to even and scaling back
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

use std::collections::HashMap;
use log::{debug, info, warn};
use crate::cold_wave::ColdWaveClassifier;
use crate::errors::StationError;
use crate::grid_sampler::GridSampler;
use crate::models::forecast::DailyValues;
use crate::models::report::StationForecastRecord;
use crate::models::station::{ObservedReading, StationPoint};
use crate::resampler::Resampler;

/// A station left out of the report and the reason for it
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStation {
    pub station: String,
    pub reason: StationError,
}

/// Outcome of processing a batch of stations
pub struct BatchOutcome {
    pub records: Vec<StationForecastRecord>,
    pub skipped: Vec<SkippedStation>,
}

/// Drives sampling, resampling and classification for each station in turn
pub struct StationAggregator<'a> {
    sampler: GridSampler<'a>,
    resampler: Resampler,
    classifier: ColdWaveClassifier,
    max_days: usize,
}

impl<'a> StationAggregator<'a> {
    /// Returns a StationAggregator
    ///
    /// # Arguments
    ///
    /// * 'sampler' - sampler over the loaded grid field
    /// * 'resampler' - daily window resampler
    /// * 'classifier' - cold wave classifier
    /// * 'max_days' - the number of days a complete record holds
    pub fn new(sampler: GridSampler<'a>, resampler: Resampler, classifier: ColdWaveClassifier, max_days: usize) -> StationAggregator<'a> {
        Self { sampler, resampler, classifier, max_days }
    }

    /// Processes every station in order. A station failing at any stage is logged and skipped,
    /// it never stops the rest of the batch.
    ///
    /// # Arguments
    ///
    /// * 'stations' - the stations to process
    /// * 'observations' - observed readings keyed by station name
    pub fn run(&self, stations: &[StationPoint], observations: &HashMap<String, ObservedReading>) -> BatchOutcome {
        let mut records: Vec<StationForecastRecord> = Vec::with_capacity(stations.len());
        let mut skipped: Vec<SkippedStation> = Vec::new();

        info!("processing {} stations using forecast variable {}", stations.len(), self.sampler.variable_name());

        for station in stations {
            match self.process_station(station, observations.get(&station.name)) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("skipping station {}: {}", station.name, e);
                    skipped.push(SkippedStation { station: station.name.clone(), reason: e });
                },
            }
        }

        info!("stations processed: {}, skipped: {}", records.len(), skipped.len());

        BatchOutcome { records, skipped }
    }

    /// Produces the forecast record for one station
    ///
    /// # Arguments
    ///
    /// * 'station' - the station to process
    /// * 'observed' - observed reading for the station, if any
    pub fn process_station(&self, station: &StationPoint, observed: Option<&ObservedReading>) -> Result<StationForecastRecord, StationError> {
        let series = self.sampler.sample(station.lat, station.lon)?;

        let days = self.resampler.resample(&series);
        if days.is_empty() {
            return Err(StationError::EmptyAggregate);
        }
        if days.len() < self.max_days {
            debug!("station {} has {} of {} forecast days", station.name, days.len(), self.max_days);
        }

        let daily_mins = days.iter().map(|d| d.min).collect::<Vec<Option<f64>>>();
        let status = self.classifier.classify(&daily_mins);
        debug!("station {}: {} -> {}", station.name, format_days(&days), status);

        Ok(StationForecastRecord {
            station: station.clone(),
            days,
            observed: observed.copied(),
            status,
        })
    }
}

/// Formats daily values for a debug line
fn format_days(days: &[DailyValues]) -> String {
    days.iter()
        .map(|d| format!("{} {:?}/{:?}", d.date, d.min, d.max))
        .collect::<Vec<String>>()
        .join(", ")
}

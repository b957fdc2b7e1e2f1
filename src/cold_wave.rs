use std::fmt;
use std::fmt::Formatter;
use serde::{Deserialize, Serialize};
use crate::config::ColdWaveParameters;

/// Cold wave signal for a station, ordered from most to least severe
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColdWaveStatus {
    #[serde(rename = "Possible Severe Cold Wave")]
    SevereColdWave,
    #[serde(rename = "Possible Cold Wave")]
    ColdWave,
    #[serde(rename = "No Cold Wave Signal")]
    NoSignal,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for ColdWaveStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ColdWaveStatus::SevereColdWave => write!(f, "Possible Severe Cold Wave"),
            ColdWaveStatus::ColdWave       => write!(f, "Possible Cold Wave"),
            ColdWaveStatus::NoSignal       => write!(f, "No Cold Wave Signal"),
        }
    }
}

/// Classifies a run of forecasted daily minimum temperatures against a two tier,
/// consecutive day, cold wave rule.
///
/// A day at or below `severe_threshold` counts towards both the severe and the plain streak,
/// a day at or below `cold_threshold` only towards the plain streak. Anything warmer, or a
/// missing day, breaks both streaks.
pub struct ColdWaveClassifier {
    severe_threshold: f64,
    cold_threshold: f64,
    streak_length: usize,
}

impl ColdWaveClassifier {
    /// Returns a classifier using the given thresholds (Celsius) and streak length (days)
    ///
    /// # Arguments
    ///
    /// * 'params' - cold wave thresholds and streak length
    pub fn new(params: &ColdWaveParameters) -> ColdWaveClassifier {
        ColdWaveClassifier {
            severe_threshold: params.severe_threshold,
            cold_threshold: params.cold_threshold,
            streak_length: params.streak_length,
        }
    }

    /// Returns the status given by the first qualifying streak in chronological order.
    ///
    /// The scan stops as soon as either streak reaches the required length, so a later and more
    /// severe streak never upgrades an earlier plain cold wave.
    ///
    /// # Arguments
    ///
    /// * 'daily_mins' - daily minimum temperatures in chronological order, None (or NaN) for missing days
    pub fn classify(&self, daily_mins: &[Option<f64>]) -> ColdWaveStatus {
        let mut cw_streak: usize = 0;
        let mut scw_streak: usize = 0;

        for &t_min in daily_mins {
            let Some(t_min) = t_min.filter(|t| !t.is_nan()) else {
                cw_streak = 0;
                scw_streak = 0;
                continue;
            };

            if t_min <= self.severe_threshold {
                scw_streak += 1;
                cw_streak += 1;
            } else if t_min <= self.cold_threshold {
                scw_streak = 0;
                cw_streak += 1;
            } else {
                scw_streak = 0;
                cw_streak = 0;
            }

            if scw_streak >= self.streak_length {
                return ColdWaveStatus::SevereColdWave;
            }
            if cw_streak >= self.streak_length {
                return ColdWaveStatus::ColdWave;
            }
        }

        ColdWaveStatus::NoSignal
    }
}

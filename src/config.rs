use std::fs;
use chrono::{FixedOffset, NaiveTime};
use log::LevelFilter;
use serde::{Deserialize, Deserializer};
use crate::errors::ConfigError;

/// One way a grid document may name its spatial axes
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct AxisSchema {
    pub lat: String,
    pub lon: String,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GridParameters {
    /// Forecast variable names tried in order before falling back to the first declared variable
    pub variable_names: Vec<String>,
    /// Axis naming schemas tried in order
    pub axis_schemas: Vec<AxisSchema>,
}

impl Default for GridParameters {
    fn default() -> Self {
        Self {
            variable_names: vec!["t2m".to_string(), "2t".to_string()],
            axis_schemas: vec![
                AxisSchema { lat: "latitude".to_string(), lon: "longitude".to_string() },
                AxisSchema { lat: "lat".to_string(), lon: "lon".to_string() },
            ],
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ResamplerParameters {
    /// Local time zone as a fixed UTC offset, e.g. "+05:45"
    #[serde(deserialize_with = "deserialize_offset")]
    pub utc_offset: FixedOffset,
    /// Local time of day where one daily window ends and the next starts
    pub cutoff: NaiveTime,
    /// Number of leading windows to discard
    pub skip_windows: usize,
    /// Max number of daily windows to keep after the discarded ones
    pub max_days: usize,
}

impl Default for ResamplerParameters {
    fn default() -> Self {
        Self {
            utc_offset: FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap(),
            cutoff: NaiveTime::from_hms_opt(8, 45, 0).unwrap(),
            skip_windows: 1,
            max_days: 6,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ColdWaveParameters {
    pub severe_threshold: f64,
    pub cold_threshold: f64,
    pub streak_length: usize,
}

impl Default for ColdWaveParameters {
    fn default() -> Self {
        Self {
            severe_threshold: 2.0,
            cold_threshold: 4.0,
            streak_length: 2,
        }
    }
}

/// Format of the observed readings source
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ObservationFormat {
    /// Plain table keyed by station name
    #[default]
    Table,
    /// Raw DHM surface observation payload, matched to stations by coordinates
    Dhm,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Files {
    pub grid_file: String,
    pub stations_file: String,
    pub observations_file: Option<String>,
    #[serde(default)]
    pub observations_format: ObservationFormat,
    pub report_file: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub general: General,
    pub files: Files,
    #[serde(default)]
    pub grid: GridParameters,
    #[serde(default)]
    pub resampler: ResamplerParameters,
    #[serde(default)]
    pub cold_wave: ColdWaveParameters,
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&toml)?;

    if config.cold_wave.streak_length == 0 {
        return Err(ConfigError::from("cold_wave.streak_length must be at least 1"));
    }
    if config.cold_wave.severe_threshold > config.cold_wave.cold_threshold {
        return Err(ConfigError::from("cold_wave.severe_threshold must not exceed cold_wave.cold_threshold"));
    }
    if config.grid.axis_schemas.is_empty() {
        return Err(ConfigError::from("grid.axis_schemas must hold at least one schema"));
    }

    Ok(config)
}

/// Parses a UTC offset on the form "+HH:MM", "-HH:MM" or "Z"
///
/// # Arguments
///
/// * 'offset' - the offset string
pub fn parse_utc_offset(offset: &str) -> Result<FixedOffset, ConfigError> {
    let offset = offset.trim();
    if offset == "Z" || offset == "UTC" {
        return FixedOffset::east_opt(0).ok_or(ConfigError::from("invalid utc offset"));
    }

    let (sign, rest) = match offset.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(ConfigError(format!("utc offset must start with '+' or '-': {}", offset))),
    };

    let (hours, minutes) = rest
        .split_once(':')
        .ok_or(ConfigError(format!("utc offset must be on the form +HH:MM: {}", offset)))?;
    let hours: i32 = hours.parse().map_err(|_| ConfigError(format!("bad hours in utc offset: {}", offset)))?;
    let minutes: i32 = minutes.parse().map_err(|_| ConfigError(format!("bad minutes in utc offset: {}", offset)))?;
    if !(0..60).contains(&minutes) {
        return Err(ConfigError(format!("bad minutes in utc offset: {}", offset)));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or(ConfigError(format!("utc offset out of range: {}", offset)))
}

fn deserialize_offset<'de, D>(deserializer: D) -> Result<FixedOffset, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_utc_offset(&s).map_err(serde::de::Error::custom)
}

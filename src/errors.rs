use std::path::PathBuf;
use thiserror::Error;

/// Error depicting problems with the configuration file
#[derive(Error, Debug)]
#[error("ConfigError: {0}")]
pub struct ConfigError(pub String);
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}

/// Error depicting an input source that can't be used, fatal for the run
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("SourceUnavailable: {path}: {msg}")]
    Unavailable { path: PathBuf, msg: String },
    #[error("SourceUnavailable: invalid grid field: {0}")]
    InvalidField(String),
    #[error("SourceUnavailable: no forecast variable found in grid field")]
    NoVariable,
}
impl SourceError {
    pub fn unavailable(path: &std::path::Path, msg: impl ToString) -> SourceError {
        SourceError::Unavailable { path: path.to_path_buf(), msg: msg.to_string() }
    }
}

/// Error for a single station, recoverable by skipping that station
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StationError {
    #[error("StationLookupFailure: no axis schema resolves in grid field (declared axes: {0})")]
    AxisUnresolved(String),
    #[error("StationLookupFailure: point ({lat}, {lon}) can't be located: {msg}")]
    PointNotLocatable { lat: f64, lon: f64, msg: String },
    #[error("StationLookupFailure: value block shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("InsufficientAggregate: no daily window left after resampling")]
    EmptyAggregate,
}

/// Error from assembling or exporting the report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("NoStationsProcessed: every station was skipped")]
    NoStationsProcessed,
    #[error("ReportError::Export: {0}")]
    Export(String),
}
impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self { ReportError::Export(e.to_string()) }
}
impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self { ReportError::Export(e.to_string()) }
}

/// Error from setting up logging
#[derive(Error, Debug)]
#[error("LoggingError: {0}")]
pub struct LoggingError(pub String);
impl From<std::io::Error> for LoggingError {
    fn from(e: std::io::Error) -> Self { LoggingError(e.to_string()) }
}
impl From<log4rs::config::runtime::ConfigErrors> for LoggingError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { LoggingError(e.to_string()) }
}
impl From<log::SetLoggerError> for LoggingError {
    fn from(e: log::SetLoggerError) -> Self { LoggingError(e.to_string()) }
}

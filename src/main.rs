use std::collections::HashMap;
use std::env;
use std::process::ExitCode;
use anyhow::{Context, Result};
use log::{error, info, warn};
use crate::aggregator::StationAggregator;
use crate::cold_wave::ColdWaveClassifier;
use crate::config::{load_config, Config};
use crate::grid_sampler::GridSampler;
use crate::logging::setup_logger;
use crate::resampler::Resampler;
use crate::sources::{load_grid_field, load_observations, load_stations};

mod aggregator;
mod cold_wave;
mod config;
mod errors;
mod grid_sampler;
mod logging;
mod models;
mod report;
mod resampler;
mod sources;

/// Config file used when none is given on the command line or in CONFIG_PATH
const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

fn main() -> ExitCode {
    let config_path = env::args().nth(1)
        .or_else(|| env::var("CONFIG_PATH").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => { eprintln!("{}", e); return ExitCode::FAILURE; },
    };

    if let Err(e) = setup_logger(&config.general) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    info!("coldwave version: {}", env!("CARGO_PKG_VERSION"));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        },
    }
}

/// Loads all sources, evaluates every station and saves the ordered report.
///
/// Missing grid or station sources abort the run before any station is processed. Observed
/// readings are optional, a source that can't be read only leaves them out.
///
/// # Arguments
///
/// * 'config' - the loaded configuration
fn run(config: &Config) -> Result<()> {
    let stations = load_stations(&config.files.stations_file)
        .context("loading station table")?;

    let observations = match &config.files.observations_file {
        Some(path) => load_observations(path, config.files.observations_format, &stations)
            .unwrap_or_else(|e| {
                warn!("continuing without observed readings: {}", e);
                HashMap::new()
            }),
        None => HashMap::new(),
    };

    let field = load_grid_field(&config.files.grid_file)
        .context("loading grid field")?;

    let sampler = GridSampler::new(&field, &config.grid)
        .context("selecting forecast variable")?;
    let aggregator = StationAggregator::new(
        sampler,
        Resampler::new(&config.resampler),
        ColdWaveClassifier::new(&config.cold_wave),
        config.resampler.max_days,
    );

    let outcome = aggregator.run(&stations, &observations);
    if !outcome.skipped.is_empty() {
        warn!("{} stations left out of the report", outcome.skipped.len());
        for s in &outcome.skipped {
            warn!("  {}: {}", s.station, s.reason);
        }
    }

    let report = report::assemble(outcome.records)
        .context("assembling report")?;
    info!("{} stations in report", report.records().len());
    report.save(&config.files.report_file)
        .context("saving report")?;
    report.log_summary();

    Ok(())
}

use std::fs;
use std::path::Path;
use log::info;
use crate::errors::ReportError;
use crate::models::report::StationForecastRecord;

/// Number of rows printed in the run summary
const SUMMARY_ROWS: usize = 10;

/// Station forecast records ordered by cold wave severity, most severe first
pub struct Report {
    records: Vec<StationForecastRecord>,
}

/// Orders the records by severity. Records with equal status keep the order they were processed in.
///
/// # Arguments
///
/// * 'records' - records in station processing order
pub fn assemble(mut records: Vec<StationForecastRecord>) -> Result<Report, ReportError> {
    if records.is_empty() {
        return Err(ReportError::NoStationsProcessed);
    }
    records.sort_by_key(|r| r.status);

    Ok(Report { records })
}

impl Report {
    /// Returns the ordered records
    pub fn records(&self) -> &[StationForecastRecord] {
        &self.records
    }

    /// Saves the report as a JSON array of flat rows, creating any missing parent directories
    ///
    /// # Arguments
    ///
    /// * 'report_file' - path to the file to write
    pub fn save(&self, report_file: &str) -> Result<(), ReportError> {
        let path = Path::new(report_file);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, json)?;

        info!("report saved: {}", path.display());

        Ok(())
    }

    /// Logs the leading rows of the report
    pub fn log_summary(&self) {
        info!("{:<30} {:>9} {}", "Station", "Day1_Min", "ColdWave_Forecast_Status");
        for record in self.records.iter().take(SUMMARY_ROWS) {
            let day1_min = record.first_day_min().map_or("-".to_string(), |m| format!("{:.2}", m));
            info!("{:<30} {:>9} {}", record.station.name, day1_min, record.status);
        }
    }
}

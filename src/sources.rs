use std::collections::HashMap;
use std::fs;
use std::path::Path;
use log::{info, warn};
use serde::de::DeserializeOwned;
use crate::config::ObservationFormat;
use crate::errors::SourceError;
use crate::models::grid_field::GriddedField;
use crate::models::station::{DhmObservation, DhmStation, ObservedReading, ObservedRow, StationPoint};

/// Max difference in degrees, on both axes, for a DHM entry to match a station (about 1 km)
const MATCH_TOLERANCE_DEG: f64 = 0.01;

/// DHM parameter code for daily max temperature
const DAILY_MAX_CODE: &str = "TX_1D";

/// DHM parameter code for daily min temperature
const DAILY_MIN_CODE: &str = "TN_1D";

/// Loads and validates the gridded forecast field
///
/// # Arguments
///
/// * 'path' - path to the grid document
pub fn load_grid_field(path: &str) -> Result<GriddedField, SourceError> {
    let field: GriddedField = read_json(Path::new(path))?;
    field.validate()?;

    info!("grid field loaded: reference time {}, {} steps, axes [{}], variables [{}]",
        field.reference_time, field.steps.len(), field.coord_names(),
        field.data_vars.keys().cloned().collect::<Vec<String>>().join(", "));

    Ok(field)
}

/// Loads the station table, in file order
///
/// # Arguments
///
/// * 'path' - path to the station table
pub fn load_stations(path: &str) -> Result<Vec<StationPoint>, SourceError> {
    let path = Path::new(path);
    let stations: Vec<StationPoint> = read_json(path)?;
    if stations.is_empty() {
        return Err(SourceError::unavailable(path, "station table is empty"));
    }

    info!("{} stations loaded", stations.len());

    Ok(stations)
}

/// Loads observed readings keyed by station name.
///
/// A plain table is keyed by its own station names, the first row for a name wins. A DHM payload
/// is matched to the given stations by coordinates.
///
/// # Arguments
///
/// * 'path' - path to the observation source
/// * 'format' - the format of the source
/// * 'stations' - the stations to match a DHM payload against
pub fn load_observations(path: &str, format: ObservationFormat, stations: &[StationPoint])
    -> Result<HashMap<String, ObservedReading>, SourceError> {

    let path = Path::new(path);
    let observations = match format {
        ObservationFormat::Table => {
            let rows: Vec<ObservedRow> = read_json(path)?;
            observations_from_table(rows)
        },
        ObservationFormat::Dhm => {
            let payload: Vec<DhmStation> = read_json(path)?;
            match_dhm_observations(&payload, stations)
        },
    };

    info!("observed readings loaded for {} stations", observations.len());

    Ok(observations)
}

/// Keys table rows by station name, keeping the first row for any duplicated name
///
/// # Arguments
///
/// * 'rows' - rows from the observation table
fn observations_from_table(rows: Vec<ObservedRow>) -> HashMap<String, ObservedReading> {
    let mut observations: HashMap<String, ObservedReading> = HashMap::new();
    for row in rows {
        if observations.contains_key(&row.station) {
            warn!("duplicate observation row for station {}, keeping the first one", row.station);
            continue;
        }
        observations.insert(row.station, ObservedReading { t_min: row.t_min, t_max: row.t_max });
    }

    observations
}

/// Matches DHM payload entries to stations by coordinates, the first entry within tolerance on
/// both latitude and longitude wins. Daily max is the largest `TX_1D` value and daily min the
/// smallest `TN_1D` value reported for the entry.
///
/// # Arguments
///
/// * 'payload' - DHM surface observation payload
/// * 'stations' - stations to match
pub fn match_dhm_observations(payload: &[DhmStation], stations: &[StationPoint]) -> HashMap<String, ObservedReading> {
    let mut observations: HashMap<String, ObservedReading> = HashMap::new();

    for station in stations {
        let matched = payload.iter().find(|dhm| {
            dhm.latitude.is_some_and(|lat| (lat - station.lat).abs() <= MATCH_TOLERANCE_DEG)
                && dhm.longitude.is_some_and(|lon| (lon - station.lon).abs() <= MATCH_TOLERANCE_DEG)
        });

        if let Some(dhm) = matched {
            let mut reading = ObservedReading::default();
            for obs in &dhm.observations {
                match obs.parameter_code.as_deref() {
                    Some(DAILY_MAX_CODE) => {
                        if let Some(max) = observation_values(obs).reduce(f64::max) {
                            reading.t_max = Some(max);
                        }
                    },
                    Some(DAILY_MIN_CODE) => {
                        if let Some(min) = observation_values(obs).reduce(f64::min) {
                            reading.t_min = Some(min);
                        }
                    },
                    _ => {},
                }
            }
            observations.entry(station.name.clone()).or_insert(reading);
        }
    }

    observations
}

/// Returns the numeric values of an observation, skipping anything that isn't `{"value": <number>}`
fn observation_values(obs: &DhmObservation) -> impl Iterator<Item = f64> + '_ {
    obs.data
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|d| d.get("value").and_then(|v| v.as_f64()))
}

/// Reads and deserializes a JSON document, any failure makes the source unavailable
///
/// # Arguments
///
/// * 'path' - path to the document
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let json = fs::read_to_string(path).map_err(|e| SourceError::unavailable(path, e))?;
    serde_json::from_str(&json).map_err(|e| SourceError::unavailable(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(name: &str, lat: f64, lon: f64) -> StationPoint {
        StationPoint { name: name.to_string(), district: None, lat, lon }
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn loads_stations_in_file_order_with_optional_district() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "stations.json", r#"[
            {"station": "Simara", "lat": 27.16, "lon": 84.98, "district": "Bara", "p1": 3.1},
            {"station": "Janakpur", "lat": 26.71, "lon": 85.92}
        ]"#);

        let stations = load_stations(&path).unwrap();

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "Simara");
        assert_eq!(stations[0].district.as_deref(), Some("Bara"));
        assert_eq!(stations[1].district, None);
    }

    #[test]
    fn missing_or_empty_station_table_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write(&dir, "stations.json", "[]");

        assert!(matches!(load_stations(&empty), Err(SourceError::Unavailable { .. })));
        assert!(matches!(load_stations("/nonexistent/stations.json"), Err(SourceError::Unavailable { .. })));
    }

    #[test]
    fn invalid_grid_field_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = write(&dir, "grid.json", "{not json");
        let no_steps = write(&dir, "grid2.json", r#"{
            "reference_time": "2024-01-01T00:00:00", "steps": [],
            "coords": {}, "data_vars": {"t2m": {"values": []}}
        }"#);

        assert!(matches!(load_grid_field(&garbage), Err(SourceError::Unavailable { .. })));
        assert!(matches!(load_grid_field(&no_steps), Err(SourceError::InvalidField(_))));
        assert!(matches!(load_grid_field("/nonexistent/grid.json"), Err(SourceError::Unavailable { .. })));
    }

    #[test]
    fn table_observations_keep_first_row_per_station() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "obs.json", r#"[
            {"station": "Simara", "t_min": 3.5, "t_max": 17.0},
            {"station": "Simara", "t_min": 9.9, "t_max": 19.9},
            {"station": "Janakpur", "t_min": null}
        ]"#);

        let obs = load_observations(&path, ObservationFormat::Table, &[]).unwrap();

        assert_eq!(obs.len(), 2);
        assert_eq!(obs["Simara"], ObservedReading { t_min: Some(3.5), t_max: Some(17.0) });
        assert_eq!(obs["Janakpur"], ObservedReading { t_min: None, t_max: None });
    }

    #[test]
    fn dhm_payload_is_matched_by_coordinates() {
        let payload: Vec<DhmStation> = serde_json::from_str(r#"[
            {"latitude": 30.0, "longitude": 80.0, "observations": []},
            {"latitude": 27.165, "longitude": 84.975, "observations": [
                {"parameter_code": "TX_1D", "data": [{"value": 16.2}, {"value": 17.4}, {"value": null}]},
                {"parameter_code": "TN_1D", "data": [{"value": 4.1}, {"value": 3.6}, "junk"]},
                {"parameter_code": "RR_1D", "data": [{"value": 0.0}]}
            ]},
            {"latitude": 26.71, "longitude": 85.92, "observations": [
                {"parameter_code": "TN_1D", "data": "not a list"}
            ]}
        ]"#).unwrap();
        let stations = vec![
            station("Simara", 27.16, 84.98),
            station("Janakpur", 26.71, 85.92),
            station("Jumla", 29.27, 82.18),
        ];

        let obs = match_dhm_observations(&payload, &stations);

        assert_eq!(obs.len(), 2);
        assert_eq!(obs["Simara"], ObservedReading { t_min: Some(3.6), t_max: Some(17.4) });
        assert_eq!(obs["Janakpur"], ObservedReading { t_min: None, t_max: None });
        assert!(!obs.contains_key("Jumla"));
    }

    #[test]
    fn dhm_match_requires_both_axes_within_tolerance() {
        let payload: Vec<DhmStation> = serde_json::from_str(r#"[
            {"latitude": 27.16, "longitude": 85.0, "observations": []},
            {"latitude": null, "longitude": 84.98, "observations": []}
        ]"#).unwrap();

        assert!(match_dhm_observations(&payload, &[station("Simara", 27.16, 84.98)]).is_empty());
    }
}

use serde::Deserialize;

/// A station as listed in the station table
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct StationPoint {
    #[serde(rename = "station")]
    pub name: String,
    #[serde(default)]
    pub district: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// Observed daily min and max temperature (Celsius) for a station
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct ObservedReading {
    pub t_min: Option<f64>,
    pub t_max: Option<f64>,
}

/// A row in the plain observation table
#[derive(Deserialize)]
pub struct ObservedRow {
    pub station: String,
    #[serde(default)]
    pub t_min: Option<f64>,
    #[serde(default)]
    pub t_max: Option<f64>,
}

/// A station entry in the DHM surface observation payload
#[derive(Deserialize)]
pub struct DhmStation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub observations: Vec<DhmObservation>,
}

/// One observed parameter for a DHM station, `data` is expected to be a list of `{"value": ..}`
#[derive(Deserialize)]
pub struct DhmObservation {
    pub parameter_code: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

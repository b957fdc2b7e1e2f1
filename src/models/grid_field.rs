use std::collections::BTreeMap;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer};
use crate::errors::SourceError;

/// A decoded forecast variable, values indexed as [lat][lon][step] in Kelvin
#[derive(Deserialize, Clone, Debug)]
pub struct Variable {
    pub values: Vec<Vec<Vec<Option<f64>>>>,
}

/// A gridded temperature field with one reference time and a run of forecast steps
///
/// Coordinate axes are kept under whatever names the producing decoder used, callers probe
/// for the names they understand.
#[derive(Deserialize, Clone, Debug)]
pub struct GriddedField {
    #[serde(deserialize_with = "deserialize_reference_time")]
    pub reference_time: DateTime<Utc>,
    /// Forecast step offsets in hours from the reference time
    pub steps: Vec<u32>,
    pub coords: BTreeMap<String, Vec<f64>>,
    pub data_vars: BTreeMap<String, Variable>,
}

impl GriddedField {
    /// Returns true if the field declares a coordinate axis with the given name
    pub fn has_coord(&self, name: &str) -> bool {
        self.coords.contains_key(name)
    }

    /// Returns the coordinate axis with the given name, if any
    pub fn coord(&self, name: &str) -> Option<&[f64]> {
        self.coords.get(name).map(|c| c.as_slice())
    }

    /// Returns the declared coordinate axis names joined for display
    pub fn coord_names(&self) -> String {
        self.coords.keys().cloned().collect::<Vec<String>>().join(", ")
    }

    /// Returns the valid time for each forecast step
    pub fn valid_times(&self) -> Vec<DateTime<Utc>> {
        self.steps
            .iter()
            .map(|s| self.reference_time + TimeDelta::hours(*s as i64))
            .collect()
    }

    /// Checks the invariants a field must fulfill before any station is sampled from it
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.steps.is_empty() {
            return Err(SourceError::InvalidField("no forecast steps".to_string()));
        }
        if self.steps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SourceError::InvalidField("forecast steps are not monotonically increasing".to_string()));
        }
        if self.data_vars.is_empty() {
            return Err(SourceError::NoVariable);
        }

        Ok(())
    }
}

/// Reference times come either with an offset (RFC 3339) or naive, in which case they are taken as UTC
fn deserialize_reference_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_reference_time(&s).map_err(serde::de::Error::custom)
}

pub fn parse_reference_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or(format!("unrecognized reference time: {}", s))
}

use serde::ser::{Serialize, SerializeMap, Serializer};
use crate::cold_wave::ColdWaveStatus;
use crate::models::forecast::DailyValues;
use crate::models::station::{ObservedReading, StationPoint};

/// Final per-station result of a run
#[derive(Clone, Debug, PartialEq)]
pub struct StationForecastRecord {
    pub station: StationPoint,
    pub days: Vec<DailyValues>,
    pub observed: Option<ObservedReading>,
    pub status: ColdWaveStatus,
}

impl StationForecastRecord {
    /// Returns the forecasted min temperature of the first retained day, if any
    pub fn first_day_min(&self) -> Option<f64> {
        self.days.first().and_then(|d| d.min)
    }
}

/// Serializes the record as one flat report row, day columns numbered from 1
impl Serialize for StationForecastRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7 + self.days.len() * 3))?;
        map.serialize_entry("Station", &self.station.name)?;
        map.serialize_entry("District", self.station.district.as_deref().unwrap_or("N/A"))?;
        map.serialize_entry("Lat", &self.station.lat)?;
        map.serialize_entry("Long", &self.station.lon)?;
        map.serialize_entry("DHM_Obs_Min", &self.observed.and_then(|o| o.t_min))?;
        map.serialize_entry("DHM_Obs_Max", &self.observed.and_then(|o| o.t_max))?;
        for (i, day) in self.days.iter().enumerate() {
            let n = i + 1;
            map.serialize_entry(&format!("Day{}_Date", n), &day.date.format("%Y-%m-%d").to_string())?;
            map.serialize_entry(&format!("Day{}_Min", n), &day.min)?;
            map.serialize_entry(&format!("Day{}_Max", n), &day.max)?;
        }
        map.serialize_entry("ColdWave_Forecast_Status", &self.status)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn record_serializes_as_flat_row() {
        let record = StationForecastRecord {
            station: StationPoint { name: "Biratnagar".to_string(), district: None, lat: 26.48, lon: 87.26 },
            days: vec![
                DailyValues { date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), min: Some(1.5), max: Some(14.25) },
                DailyValues { date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), min: None, max: None },
            ],
            observed: Some(ObservedReading { t_min: Some(3.2), t_max: None }),
            status: ColdWaveStatus::ColdWave,
        };

        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(json, concat!(
            r#"{"Station":"Biratnagar","District":"N/A","Lat":26.48,"Long":87.26,"#,
            r#""DHM_Obs_Min":3.2,"DHM_Obs_Max":null,"#,
            r#""Day1_Date":"2024-01-02","Day1_Min":1.5,"Day1_Max":14.25,"#,
            r#""Day2_Date":"2024-01-03","Day2_Min":null,"Day2_Max":null,"#,
            r#""ColdWave_Forecast_Status":"Possible Cold Wave"}"#,
        ));
    }
}

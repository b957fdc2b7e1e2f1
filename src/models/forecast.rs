use chrono::{DateTime, NaiveDate, Utc};

/// Temperature (Celsius) at one valid time, None when the grid holds no usable value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeValues {
    pub valid_time: DateTime<Utc>,
    pub temp: Option<f64>,
}

/// Min and max temperature (Celsius) for one daily window, labeled by the local date it ends on
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DailyValues {
    pub date: NaiveDate,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

use log::debug;
use crate::config::{AxisSchema, GridParameters};
use crate::errors::{SourceError, StationError};
use crate::models::forecast::TimeValues;
use crate::models::grid_field::{GriddedField, Variable};

/// Offset between Kelvin and Celsius
const KELVIN_OFFSET: f64 = 273.15;

/// Coldest temperature (Celsius) accepted as a real forecast value
const MIN_SANE_TEMP: f64 = -90.0;

/// Warmest temperature (Celsius) accepted as a real forecast value
const MAX_SANE_TEMP: f64 = 60.0;

/// Struct for extracting nearest grid point time series from a gridded temperature field
pub struct GridSampler<'a> {
    field: &'a GriddedField,
    variable_name: String,
    variable: &'a Variable,
    axis_schemas: &'a [AxisSchema],
}

impl<'a> GridSampler<'a> {
    /// Returns a GridSampler for the given field.
    ///
    /// The forecast variable is picked from the configured candidate names in order, and if none
    /// of them is present the first variable declared in the field is used.
    ///
    /// # Arguments
    ///
    /// * 'field' - the gridded field to sample from
    /// * 'params' - candidate variable names and axis schemas
    pub fn new(field: &'a GriddedField, params: &'a GridParameters) -> Result<GridSampler<'a>, SourceError> {
        let (variable_name, variable) = params.variable_names
            .iter()
            .find_map(|name| field.data_vars.get_key_value(name))
            .or_else(|| field.data_vars.iter().next())
            .ok_or(SourceError::NoVariable)?;

        Ok(Self {
            field,
            variable_name: variable_name.clone(),
            variable,
            axis_schemas: &params.axis_schemas,
        })
    }

    /// Returns the name of the forecast variable in use
    pub fn variable_name(&self) -> &str {
        &self.variable_name
    }

    /// Returns the forecast time series (Celsius) of the grid cell nearest to the given point.
    ///
    /// Longitude is normalized to [0, 360) before lookup, latitude is used as is. Values that
    /// are missing, or fall outside a physically sane range after conversion, are returned as None.
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude of the point in decimal degrees
    /// * 'lon' - longitude of the point in decimal degrees
    pub fn sample(&self, lat: f64, lon: f64) -> Result<Vec<TimeValues>, StationError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(StationError::PointNotLocatable { lat, lon, msg: "non finite coordinate".to_string() });
        }

        let schema = resolve_axis_schema(self.field, self.axis_schemas)
            .ok_or_else(|| StationError::AxisUnresolved(self.field.coord_names()))?;
        let lat_axis = self.field.coord(&schema.lat).unwrap_or_default();
        let lon_axis = self.field.coord(&schema.lon).unwrap_or_default();

        let lat_idx = nearest_index(lat_axis, lat, |a, b| (a - b).abs())
            .ok_or_else(|| StationError::PointNotLocatable { lat, lon, msg: format!("empty axis '{}'", schema.lat) })?;
        let lon_idx = nearest_index(lon_axis, normalize_longitude(lon), longitude_distance)
            .ok_or_else(|| StationError::PointNotLocatable { lat, lon, msg: format!("empty axis '{}'", schema.lon) })?;

        debug!("point ({}, {}) resolved to grid cell ({}, {}) using axes {}/{}",
            lat, lon, lat_axis[lat_idx], lon_axis[lon_idx], schema.lat, schema.lon);

        let values = self.cell_values(lat_axis.len(), lon_axis.len(), lat_idx, lon_idx)?;

        let series = self.field.valid_times()
            .into_iter()
            .zip(values.iter())
            .map(|(valid_time, k)| TimeValues { valid_time, temp: k.and_then(kelvin_to_celsius) })
            .collect();

        Ok(series)
    }

    /// Returns the values for one grid cell after checking the value block matches the axes
    ///
    /// # Arguments
    ///
    /// * 'lat_len' - length of the latitude axis
    /// * 'lon_len' - length of the longitude axis
    /// * 'lat_idx' - latitude index of the cell
    /// * 'lon_idx' - longitude index of the cell
    fn cell_values(&self, lat_len: usize, lon_len: usize, lat_idx: usize, lon_idx: usize) -> Result<&'a [Option<f64>], StationError> {
        let values = &self.variable.values;
        if values.len() != lat_len {
            return Err(StationError::ShapeMismatch(
                format!("{} latitude rows for an axis of length {}", values.len(), lat_len)));
        }

        let row = &values[lat_idx];
        if row.len() != lon_len {
            return Err(StationError::ShapeMismatch(
                format!("{} longitude columns for an axis of length {}", row.len(), lon_len)));
        }

        let cell = &row[lon_idx];
        if cell.len() != self.field.steps.len() {
            return Err(StationError::ShapeMismatch(
                format!("{} values for {} forecast steps", cell.len(), self.field.steps.len())));
        }

        Ok(cell)
    }
}

/// Returns the first axis schema whose axes are all declared by the field
///
/// # Arguments
///
/// * 'field' - the field to probe
/// * 'schemas' - candidate schemas in order of preference
pub fn resolve_axis_schema<'s>(field: &GriddedField, schemas: &'s [AxisSchema]) -> Option<&'s AxisSchema> {
    schemas.iter().find(|s| field.has_coord(&s.lat) && field.has_coord(&s.lon))
}

/// Normalizes a longitude to [0, 360)
pub fn normalize_longitude(lon: f64) -> f64 {
    let normalized = lon.rem_euclid(360.0);
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Distance in degrees between two longitudes, wrapping at 360
fn longitude_distance(axis_value: f64, target: f64) -> f64 {
    let d = (normalize_longitude(axis_value) - target).abs();
    d.min(360.0 - d)
}

/// Returns the index of the axis value closest to the target, the lowest index on ties.
/// Non finite axis values are never selected.
///
/// # Arguments
///
/// * 'axis' - coordinate values
/// * 'target' - value to look for
/// * 'distance' - distance measure between an axis value and the target
fn nearest_index(axis: &[f64], target: f64, distance: impl Fn(f64, f64) -> f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (i, distance(*v, target)))
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

/// Converts Kelvin to Celsius, None if the result is outside the sane range
fn kelvin_to_celsius(kelvin: f64) -> Option<f64> {
    let celsius = kelvin - KELVIN_OFFSET;
    if (MIN_SANE_TEMP..=MAX_SANE_TEMP).contains(&celsius) {
        Some(celsius)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use chrono::{TimeZone, Utc};

    /// 2 x 3 grid with 2 steps, the value at (i, j, k) is 270 + 10 * i + j + 0.5 * k
    fn field(lat_name: &str, lon_name: &str, lons: Vec<f64>) -> GriddedField {
        let lats = vec![27.5, 27.75];
        let values = (0..lats.len())
            .map(|i| (0..lons.len())
                .map(|j| (0..2).map(|k| Some(270.0 + 10.0 * i as f64 + j as f64 + 0.5 * k as f64)).collect())
                .collect())
            .collect();

        GriddedField {
            reference_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            steps: vec![0, 3],
            coords: BTreeMap::from([(lat_name.to_string(), lats), (lon_name.to_string(), lons)]),
            data_vars: BTreeMap::from([("t2m".to_string(), Variable { values })]),
        }
    }

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn samples_nearest_cell_and_converts_to_celsius() {
        let field = field("latitude", "longitude", vec![85.0, 85.25, 85.5]);
        let params = GridParameters::default();
        let sampler = GridSampler::new(&field, &params).unwrap();

        let series = sampler.sample(27.7, 85.3).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].valid_time, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(series[1].valid_time, Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap());
        assert!(approx(series[0].temp, 281.0 - 273.15));
        assert!(approx(series[1].temp, 281.5 - 273.15));
    }

    #[test]
    fn falls_back_to_short_axis_names() {
        let field = field("lat", "lon", vec![85.0, 85.25, 85.5]);
        let params = GridParameters::default();
        let sampler = GridSampler::new(&field, &params).unwrap();

        let series = sampler.sample(27.5, 85.5).unwrap();
        assert!(approx(series[0].temp, 272.0 - 273.15));
    }

    #[test]
    fn unresolved_axes_fail_the_station_only() {
        let field = field("y", "x", vec![85.0, 85.25, 85.5]);
        let params = GridParameters::default();
        let sampler = GridSampler::new(&field, &params).unwrap();

        assert!(matches!(sampler.sample(27.7, 85.3), Err(StationError::AxisUnresolved(_))));
    }

    #[test]
    fn negative_longitude_is_normalized() {
        let field = field("latitude", "longitude", vec![0.0, 180.0, 359.0]);
        let params = GridParameters::default();
        let sampler = GridSampler::new(&field, &params).unwrap();

        let series = sampler.sample(27.5, -1.2).unwrap();
        assert!(approx(series[0].temp, 272.0 - 273.15));
    }

    #[test]
    fn grid_in_signed_longitudes_resolves_same_cell() {
        let field = field("latitude", "longitude", vec![-1.0, 0.0, 1.0]);
        let params = GridParameters::default();
        let sampler = GridSampler::new(&field, &params).unwrap();

        let series = sampler.sample(27.5, 359.1).unwrap();
        assert!(approx(series[0].temp, 270.0 - 273.15));
    }

    #[test]
    fn out_of_range_values_become_missing() {
        let mut field = field("latitude", "longitude", vec![85.0]);
        field.data_vars.get_mut("t2m").unwrap().values[0][0] = vec![Some(9999.0), None];
        let params = GridParameters::default();
        let sampler = GridSampler::new(&field, &params).unwrap();

        let series = sampler.sample(27.5, 85.0).unwrap();
        assert_eq!(series[0].temp, None);
        assert_eq!(series[1].temp, None);
    }

    #[test]
    fn sampled_values_stay_within_sane_range() {
        let field = field("latitude", "longitude", vec![85.0, 85.25, 85.5]);
        let params = GridParameters::default();
        let sampler = GridSampler::new(&field, &params).unwrap();

        for (lat, lon) in [(27.5, 85.0), (27.9, 86.0), (-40.0, -100.0)] {
            for v in sampler.sample(lat, lon).unwrap() {
                assert!(v.temp.is_none_or(|t| (MIN_SANE_TEMP..=MAX_SANE_TEMP).contains(&t)));
            }
        }
    }

    #[test]
    fn shape_mismatch_is_a_station_error() {
        let mut field = field("latitude", "longitude", vec![85.0, 85.25]);
        field.data_vars.get_mut("t2m").unwrap().values[1][0] = vec![Some(280.0)];
        let params = GridParameters::default();
        let sampler = GridSampler::new(&field, &params).unwrap();

        assert!(matches!(sampler.sample(27.75, 85.0), Err(StationError::ShapeMismatch(_))));
        assert!(sampler.sample(27.5, 85.0).is_ok());
    }

    #[test]
    fn non_finite_point_is_not_locatable() {
        let field = field("latitude", "longitude", vec![85.0]);
        let params = GridParameters::default();
        let sampler = GridSampler::new(&field, &params).unwrap();

        assert!(matches!(sampler.sample(f64::NAN, 85.0), Err(StationError::PointNotLocatable { .. })));
    }

    #[test]
    fn variable_selection_prefers_candidates_then_first_declared() {
        let mut field = field("latitude", "longitude", vec![85.0]);
        let t2m = field.data_vars.remove("t2m").unwrap();
        field.data_vars.insert("2t".to_string(), t2m.clone());
        field.data_vars.insert("10u".to_string(), t2m.clone());
        let params = GridParameters::default();

        assert_eq!(GridSampler::new(&field, &params).unwrap().variable_name(), "2t");

        field.data_vars.remove("2t");
        assert_eq!(GridSampler::new(&field, &params).unwrap().variable_name(), "10u");

        field.data_vars.clear();
        assert!(matches!(GridSampler::new(&field, &params), Err(SourceError::NoVariable)));
    }

    #[test]
    fn nearest_index_takes_lowest_on_ties() {
        assert_eq!(nearest_index(&[1.0, 2.0, 3.0], 2.5, |a, b| (a - b).abs()), Some(1));
        assert_eq!(nearest_index(&[], 2.5, |a, b| (a - b).abs()), None);
        assert_eq!(nearest_index(&[f64::NAN, 4.0], 0.0, |a, b| (a - b).abs()), Some(1));
    }

    #[test]
    fn normalizes_longitudes() {
        assert_eq!(normalize_longitude(-90.0), 270.0);
        assert_eq!(normalize_longitude(360.0), 0.0);
        assert_eq!(normalize_longitude(85.3), 85.3);
    }
}

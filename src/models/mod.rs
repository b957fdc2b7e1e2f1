pub mod forecast;
pub mod grid_field;
pub mod report;
pub mod station;

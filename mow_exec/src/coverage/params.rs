//! Coverage planner parameters

// External
use serde::{Deserialize, Serialize};

/// Parameters for the coverage planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageParams {
    /// Distance between adjacent rows.
    ///
    /// Units: centimetres
    pub row_width_cm: f64,

    /// Estimated distance after which a row ends.
    ///
    /// Units: centimetres
    pub row_length_max_cm: f64,

    /// Number of rows in a pattern
    pub max_rows: u32,

    /// Assumed ground speed while mowing, converts time on a row to distance.
    ///
    /// Units: centimetres/second
    pub assumed_speed_cms: f64,

    /// Hard cap on the time spent on one row.
    ///
    /// Units: seconds
    pub row_time_cap_s: f64,

    /// Heading of the first row, the second row runs the opposite way.
    ///
    /// Units: degrees
    pub base_heading_deg: f64,
}

impl Default for CoverageParams {
    fn default() -> Self {
        Self {
            row_width_cm: 30.0,
            row_length_max_cm: 500.0,
            max_rows: 50,
            assumed_speed_cms: 20.0,
            row_time_cap_s: 30.0,
            base_heading_deg: 0.0,
        }
    }
}

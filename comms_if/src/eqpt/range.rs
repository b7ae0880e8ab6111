//! # Ultrasonic range readings

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Distances measured by the three forward-facing ultrasonic sensors.
///
/// A reading of zero or less means the sensor received no echo. Readings beyond the
/// sensor's maximum range are likewise meaningless; consumers treat both as "nothing seen".
///
/// Units: centimeters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeReadings {
    pub left_cm: f64,
    pub middle_cm: f64,
    pub right_cm: f64,
}

impl RangeReadings {
    pub fn new(left_cm: f64, middle_cm: f64, right_cm: f64) -> Self {
        Self {
            left_cm,
            middle_cm,
            right_cm,
        }
    }
}

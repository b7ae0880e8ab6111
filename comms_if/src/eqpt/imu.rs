//! # Inertial measurement samples

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One sample from the inertial measurement unit.
///
/// All vectors are in the body frame: X forwards, Y to the right, Z downwards. With this
/// frame a positive Z rate is a clockwise turn seen from above, i.e. increasing heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuSample {
    /// Accelerometer reading, reads `[0, 0, 1]` when level and stationary.
    ///
    /// Units: g
    pub accel_g: [f64; 3],

    /// Gyroscope reading.
    ///
    /// Units: radians/second
    pub gyro_rads: [f64; 3],

    /// Magnetometer reading, `None` if the unit has no magnetometer or it failed to read.
    ///
    /// Units: microtesla
    pub mag_ut: Option<[f64; 3]>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ImuSample {
    fn default() -> Self {
        Self {
            accel_g: [0.0, 0.0, 1.0],
            gyro_rads: [0.0; 3],
            mag_ut: None,
        }
    }
}

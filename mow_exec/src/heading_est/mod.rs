//! # Heading estimation module
//!
//! Fuses accelerometer, gyroscope and (when fitted) magnetometer samples into the mower's
//! heading, pitch and roll.
//!
//! Pitch and roll come from a low-pass filtered accelerometer vector. Heading comes from
//! integrating the bias-corrected gyroscope Z rate, which is smooth but drifts without
//! bound. When a magnetometer is present its tilt-compensated heading is blended into the
//! integrated heading by a complementary filter, anchoring the drift. The blend always
//! travels along the shortest arc, so readings either side of north (say 359° and 1°)
//! blend to 0° and never to 180°.
//!
//! Headings are compass-style degrees in `[0, 360)`, increasing clockwise seen from above.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calib;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use calib::*;
pub use params::*;
pub use state::*;

use crate::eqpt::EqptError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during heading estimation.
#[derive(Debug, thiserror::Error)]
pub enum HeadingEstError {
    #[error("Failed to load HeadingEst parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("No inertial sample available: {0}")]
    SampleUnavailable(EqptError),

    #[error("Inertial sample contains non-finite values")]
    InvalidSample,

    #[error("Gyro calibration failed, none of the {0} sample reads succeeded")]
    GyroCalibrationFailed(usize),

    #[error("Cannot calibrate the magnetometer, none is fitted")]
    NoMagnetometer,

    #[error("Magnetometer calibration is not running")]
    MagCalibrationNotStarted,

    #[error(
        "Magnetometer calibration saw too little variation ({0:.1} uT on X, {1:.1} uT on Y), \
        was the mower rotating?"
    )]
    MagCalibrationDegenerate(f64, f64),
}

//! # Equipment interfaces
//!
//! The navigation core never talks to hardware directly. Each piece of equipment is reached
//! through one of the narrow traits in this module, and anything implementing all of them
//! is a [`MowerEqpt`] which can be handed to [`crate::data_store::DataStore::cycle`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{imu::ImuSample, perimeter::BoundaryStatus, range::RangeReadings};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Accelerometer, gyroscope and (optionally) magnetometer.
pub trait InertialSource {
    /// Read the latest calibrated sample.
    fn read_inertial(&mut self) -> Result<ImuSample, EqptError>;

    /// True if the unit carries a working magnetometer.
    fn has_magnetometer(&self) -> bool;
}

/// The three forward-facing ultrasonic range sensors.
pub trait RangeSensors {
    /// Measure all three distances.
    fn read_ranges(&mut self) -> Result<RangeReadings, EqptError>;
}

/// Differential drivetrain.
///
/// Speeds are signed, positive is forwards, and limited to `[-max, max]` where the maximum
/// is a property of the power stage.
pub trait Drivetrain {
    /// Command the left and right wheel speeds.
    fn set_speed(&mut self, left: i32, right: i32);

    /// Cut drive power immediately, independently of any controller state.
    fn emergency_stop(&mut self);
}

/// The cutting blade relay.
pub trait CuttingActuator {
    fn start_blade(&mut self);

    fn stop_blade(&mut self);

    fn blade_running(&self) -> bool;

    /// The safety lock is an independent interlock, the blade must not be started while it is
    /// engaged.
    fn blade_safety_locked(&self) -> bool;

    /// Stop the blade immediately.
    fn blade_emergency_stop(&mut self);
}

/// Battery voltage monitor.
pub trait BatteryMonitor {
    /// Measure the battery voltage.
    ///
    /// Units: volts
    fn read_voltage(&mut self) -> Result<f64, EqptError>;
}

/// Perimeter wire receiver.
pub trait BoundarySensor {
    fn read_boundary(&mut self) -> Result<BoundaryStatus, EqptError>;
}

/// All the equipment the navigation core needs.
pub trait MowerEqpt:
    InertialSource + RangeSensors + Drivetrain + CuttingActuator + BatteryMonitor + BoundarySensor
{
}

impl<T> MowerEqpt for T where
    T: InertialSource
        + RangeSensors
        + Drivetrain
        + CuttingActuator
        + BatteryMonitor
        + BoundarySensor
{
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by equipment.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EqptError {
    #[error("The {0} did not respond")]
    NoResponse(&'static str),

    #[error("The {0} returned an invalid reading: {1}")]
    InvalidReading(&'static str, String),

    #[error("The {0} is not fitted")]
    NotFitted(&'static str),
}

//! # Equipment sample definitions
//!
//! Samples produced by the mower's sensors, in the calibrated units the navigation core
//! expects. How the samples are acquired is up to each equipment implementation.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod imu;
pub mod perimeter;
pub mod range;

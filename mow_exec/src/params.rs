//! # Mower Executable Parameters
//!
//! This module provides parameters for the mower executable itself, the module parameters
//! live alongside each module.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MowExecParams {
    /// Minimum log level, one of `info`, `debug` or `trace`
    pub log_level: String,

    /// Period between ultrasonic range measurements.
    ///
    /// Units: seconds
    pub range_period_s: f64,

    /// Period between heading estimator updates.
    ///
    /// Units: seconds
    pub imu_period_s: f64,

    /// Period between battery measurements.
    ///
    /// Units: seconds
    pub battery_period_s: f64,

    /// Period between telemetry snapshots.
    ///
    /// Units: seconds
    pub tm_period_s: f64,

    /// Length of an autostarted run (no script given) after which the executable exits.
    ///
    /// Units: seconds
    pub max_session_s: f64,

    /// Start mowing immediately when no script is given
    pub autostart: bool,
}

impl Default for MowExecParams {
    fn default() -> Self {
        Self {
            log_level: String::from("info"),
            range_period_s: 0.1,
            imu_period_s: 0.05,
            battery_period_s: 5.0,
            tm_period_s: 1.0,
            max_session_s: 3600.0,
            autostart: true,
        }
    }
}

//! Mission manager parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::battery::BatteryParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the mission manager and all its states.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionParams {
    /// Maximum time in any active state before it is considered stuck.
    ///
    /// Units: seconds
    pub state_timeout_s: f64,

    /// Maximum time in the calibrating state.
    ///
    /// Units: seconds
    pub calibration_timeout_s: f64,

    /// Maximum time searching for the perimeter signal.
    ///
    /// Units: seconds
    pub search_timeout_s: f64,

    /// Time spent pivoting while calibrating the magnetometer.
    ///
    /// Units: seconds
    pub mag_calib_duration_s: f64,

    /// Go to error if the mower is tilted past the estimator's threshold
    pub abort_on_tilt: bool,

    /// Number of consecutive failed inertial reads before a fault is raised
    pub max_imu_failures: u32,

    pub battery: BatteryParams,

    pub avoid: AvoidParams,

    pub boundary_recovery: RecoveryParams,

    pub wire_follow: WireFollowParams,

    pub search: SearchParams,
}

/// Obstacle avoidance manoeuvre: reverse, pause, then pivot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidParams {
    /// Reverse distance when avoiding left or right.
    ///
    /// Units: centimetres
    pub side_backup_cm: f64,

    /// Reverse distance when backing away from a blocked front.
    ///
    /// Units: centimetres
    pub back_backup_cm: f64,

    /// Units: seconds
    pub hold_s: f64,

    /// Pivot time when avoiding left or right.
    ///
    /// Units: seconds
    pub side_pivot_s: f64,

    /// Pivot time after backing away from a blocked front.
    ///
    /// Units: seconds
    pub back_pivot_s: f64,

    /// Time to wait stopped after a manoeuvre leaves the obstacle in view before trying
    /// again in the same direction.
    ///
    /// Units: seconds
    pub retry_dwell_s: f64,
}

/// Recovery from a boundary breach outside of a mowing pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryParams {
    /// Units: centimetres
    pub backup_cm: f64,

    /// Units: seconds
    pub hold_s: f64,

    /// Pivot time away from the wire, roughly 135 degrees.
    ///
    /// Units: seconds
    pub pivot_s: f64,
}

/// Reactive wire following used when returning to base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WireFollowParams {
    /// Signal strength to hold, sets the distance from the wire.
    ///
    /// Units: percent
    pub target_strength: f64,

    /// Half width of the accepted strength band.
    ///
    /// Units: percent
    pub strength_band: f64,

    /// Wheel speed difference used to steer towards or away from the wire
    pub steer_delta: i32,

    /// Pivot back inside after finding the mower outside.
    ///
    /// Units: seconds
    pub outside_pivot_s: f64,

    /// Nudge away from the wire when on top of it.
    ///
    /// Units: seconds
    pub on_wire_pivot_s: f64,
}

/// Outward spiral used to look for a lost perimeter signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Units: seconds
    pub leg_base_s: f64,

    /// Added to the forward leg on each step.
    ///
    /// Units: seconds
    pub leg_step_s: f64,

    /// Units: seconds
    pub leg_max_s: f64,

    /// Units: seconds
    pub turn_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for MissionParams {
    fn default() -> Self {
        Self {
            state_timeout_s: 300.0,
            calibration_timeout_s: 30.0,
            search_timeout_s: 120.0,
            mag_calib_duration_s: 20.0,
            abort_on_tilt: true,
            max_imu_failures: 20,
            battery: BatteryParams::default(),
            avoid: AvoidParams::default(),
            boundary_recovery: RecoveryParams::default(),
            wire_follow: WireFollowParams::default(),
            search: SearchParams::default(),
        }
    }
}

impl Default for AvoidParams {
    fn default() -> Self {
        Self {
            side_backup_cm: 30.0,
            back_backup_cm: 60.0,
            hold_s: 0.5,
            side_pivot_s: 1.0,
            back_pivot_s: 1.5,
            retry_dwell_s: 1.0,
        }
    }
}

impl Default for RecoveryParams {
    fn default() -> Self {
        Self {
            backup_cm: 30.0,
            hold_s: 0.5,
            pivot_s: 1.5,
        }
    }
}

impl Default for WireFollowParams {
    fn default() -> Self {
        Self {
            target_strength: 30.0,
            strength_band: 10.0,
            steer_delta: 30,
            outside_pivot_s: 0.2,
            on_wire_pivot_s: 0.1,
        }
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            leg_base_s: 0.2,
            leg_step_s: 0.01,
            leg_max_s: 2.0,
            turn_s: 0.3,
        }
    }
}

//! Motion control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for motion control.
///
/// Wheel speeds are in drivetrain units, a signed integer where the magnitude is limited to
/// `max_speed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionCtrlParams {
    /// Heading controller proportional gain
    pub k_p: f64,

    /// Heading controller integral gain
    pub k_i: f64,

    /// Heading controller derivative gain
    pub k_d: f64,

    /// Symmetric bound on the heading controller integral accumulator
    pub integral_limit: f64,

    /// Symmetric bound on the left/right correction applied around the base speed
    pub correction_limit: f64,

    /// Maximum wheel speed magnitude accepted by the drivetrain
    pub max_speed: i32,

    /// Minimum wheel speed while driving straight, below this the wheels stall
    pub min_speed: i32,

    /// Base speed while mowing a row
    pub cruise_speed: i32,

    /// Pivot speed used when turning onto a heading
    pub turn_speed: i32,

    /// Reduced speed used near obstacles and when following the boundary wire
    pub slow_speed: i32,

    /// Wheel speed while reversing
    pub backup_speed: i32,

    /// Heading error under which a turn is complete.
    ///
    /// Units: degrees
    pub heading_tolerance_deg: f64,

    /// Assumed ground speed while reversing at `backup_speed`, used to convert a back-up
    /// distance into a duration. There is no distance feedback.
    ///
    /// Units: centimetres/second
    pub assumed_reverse_speed_cms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for MotionCtrlParams {
    fn default() -> Self {
        Self {
            k_p: 2.0,
            k_i: 0.1,
            k_d: 0.5,
            integral_limit: 100.0,
            correction_limit: 100.0,
            max_speed: 255,
            min_speed: 100,
            cruise_speed: 200,
            turn_speed: 180,
            slow_speed: 150,
            backup_speed: 170,
            heading_tolerance_deg: 5.0,
            assumed_reverse_speed_cms: 15.0,
        }
    }
}

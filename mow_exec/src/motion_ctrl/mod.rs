//! # Motion control module
//!
//! Turns high level movement requests (hold a heading, turn onto a heading, pivot, back up)
//! into left and right wheel speed demands for a differential drivetrain.
//!
//! Exactly one [`MotionMode`] is active at a time. Entering a mode resets the heading PID
//! so no integral carries over from a previous manoeuvre. All operations are non-blocking,
//! including [`MotionCtrl::back_up`] which only starts the reverse and tells the caller how
//! long it should last.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod pid;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
pub use params::*;
pub use pid::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The movement the controller is currently performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    Idle,
    DriveStraight,
    TurningToHeading,
    TurningInPlace,
    BackingUp,

    /// Open-loop wheel speeds set by the caller
    Direct,
}

/// Direction of a pivot turn, seen from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnDir {
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for MotionMode {
    fn default() -> Self {
        MotionMode::Idle
    }
}

impl std::fmt::Display for MotionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MotionMode::Idle => "IDLE",
            MotionMode::DriveStraight => "DRIVE_STRAIGHT",
            MotionMode::TurningToHeading => "TURNING_TO_HEADING",
            MotionMode::TurningInPlace => "TURNING_IN_PLACE",
            MotionMode::BackingUp => "BACKING_UP",
            MotionMode::Direct => "DIRECT",
        };
        write!(f, "{}", s)
    }
}

impl TurnDir {
    /// The other direction.
    pub fn opposite(self) -> Self {
        match self {
            TurnDir::Left => TurnDir::Right,
            TurnDir::Right => TurnDir::Left,
        }
    }

    /// Turn direction which reduces a signed heading error (positive is clockwise).
    pub fn from_error(err_deg: f64) -> Self {
        if err_deg > 0.0 {
            TurnDir::Right
        }
        else {
            TurnDir::Left
        }
    }
}

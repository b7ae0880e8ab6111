//! # Mission telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command changing the mission the mower is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StructOpt)]
pub enum MissionCmd {
    /// Start mowing. An unfinished pattern is resumed, otherwise a new pattern is started.
    #[structopt(name = "start")]
    Start,

    /// Pause mowing, keeping the current pattern so it can be resumed with `start`.
    #[structopt(name = "pause")]
    Pause,

    /// Stop whatever the mower is doing and abandon the current pattern.
    #[structopt(name = "stop")]
    Stop,

    /// Follow the perimeter wire back to the base station.
    #[structopt(name = "return")]
    ReturnToBase,

    /// Search for a lost perimeter signal.
    #[structopt(name = "search")]
    SearchSignal,

    /// Calibrate one of the inertial sensors. The mower must be on open, level ground.
    #[structopt(name = "calibrate")]
    Calibrate(CalibKind),

    /// Make the current heading the zero reference.
    #[structopt(name = "reset-heading")]
    ResetHeading,

    /// Leave the error state, returning to idle.
    #[structopt(name = "recover")]
    Recover,
}

/// The sensor to calibrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StructOpt)]
pub enum CalibKind {
    /// Average the gyroscope output while stationary to find its bias.
    #[structopt(name = "gyro")]
    Gyro,

    /// Rotate in place to find the magnetometer's hard and soft iron corrections.
    #[structopt(name = "mag")]
    Magnetometer,
}

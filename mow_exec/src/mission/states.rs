//! # Mission states

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use serde::Serialize;

use super::{
    avoiding::Avoiding, calibrating::Calibrating, mowing::Mowing, returning::Returning,
    searching::SearchingSignal, turning::Turning,
};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The mission state, with the data each state needs.
#[derive(Debug, Clone)]
pub enum MissionState {
    /// Waiting for a command, actuators held at rest
    Idle,

    /// Wheels and blade driven directly by external commands
    Manual,

    Calibrating(Calibrating),

    Mowing(Mowing),

    Turning(Turning),

    Avoiding(Avoiding),

    Returning(Returning),

    SearchingSignal(SearchingSignal),

    /// Everything stopped until an explicit recovery
    Error { cause: String },
}

/// The kind of a [`MissionState`] without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StateKind {
    Idle,
    Manual,
    Calibrating,
    Mowing,
    Turning,
    Avoiding,
    Returning,
    SearchingSignal,
    Error,
}

/// Result of stepping a state.
#[derive(Debug)]
pub enum Transition {
    Stay,
    To(MissionState),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MissionState {
    pub fn error<S: Into<String>>(cause: S) -> Self {
        MissionState::Error {
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> StateKind {
        match self {
            MissionState::Idle => StateKind::Idle,
            MissionState::Manual => StateKind::Manual,
            MissionState::Calibrating(_) => StateKind::Calibrating,
            MissionState::Mowing(_) => StateKind::Mowing,
            MissionState::Turning(_) => StateKind::Turning,
            MissionState::Avoiding(_) => StateKind::Avoiding,
            MissionState::Returning(_) => StateKind::Returning,
            MissionState::SearchingSignal(_) => StateKind::SearchingSignal,
            MissionState::Error { .. } => StateKind::Error,
        }
    }
}

impl Display for MissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

impl StateKind {
    /// True for the states in which the mower moves on its own.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            StateKind::Mowing
                | StateKind::Turning
                | StateKind::Avoiding
                | StateKind::Returning
                | StateKind::SearchingSignal
        )
    }

    /// True for the states in which the mower is expected to drive forwards.
    pub fn drives_forward(self) -> bool {
        matches!(
            self,
            StateKind::Mowing | StateKind::Returning | StateKind::SearchingSignal
        )
    }

    /// True for the states the global state timeout applies to.
    pub fn has_timeout(self) -> bool {
        !matches!(self, StateKind::Idle | StateKind::Manual | StateKind::Error)
    }

    /// Upper case name used in logs and telemetry.
    pub fn name(self) -> &'static str {
        match self {
            StateKind::Idle => "IDLE",
            StateKind::Manual => "MANUAL",
            StateKind::Calibrating => "CALIBRATING",
            StateKind::Mowing => "MOWING",
            StateKind::Turning => "TURNING",
            StateKind::Avoiding => "AVOIDING",
            StateKind::Returning => "RETURNING",
            StateKind::SearchingSignal => "SEARCHING_SIGNAL",
            StateKind::Error => "ERROR",
        }
    }
}

impl Display for StateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

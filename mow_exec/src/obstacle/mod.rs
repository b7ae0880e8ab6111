//! # Obstacle avoidance module
//!
//! Assesses the three forward range sensors each time fresh readings arrive and decides
//! which way the mower should go to get around whatever is in front of it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Way around an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvoidDir {
    Left,
    Right,
    Back,
}

impl std::fmt::Display for AvoidDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AvoidDir::Left => "LEFT",
            AvoidDir::Right => "RIGHT",
            AvoidDir::Back => "BACK",
        };
        write!(f, "{}", s)
    }
}

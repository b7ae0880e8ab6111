//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications 
//! interface.
//!
//! Telecommands are carried as JSON using serde's externally tagged enum representation,
//! for example `{"Mission": "Start"}` or `{"Manual": {"Tank": {"left": 150, "right": 150}}}`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod manual;
pub mod mission;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use structopt::StructOpt;
use thiserror::Error;

// Internal
use manual::ManualCmd;
use mission::MissionCmd;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the mower by an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum Tc {
    /// Mission level command, changes what the mower is doing.
    #[structopt(name = "mission")]
    Mission(MissionCmd),

    /// Direct wheel or blade command, puts the mower in manual mode.
    #[structopt(name = "manual")]
    Manual(ManualCmd),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC is empty")]
    Empty,

    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        let trimmed = json_str.trim();

        if trimmed.is_empty() {
            return Err(TcParseError::Empty);
        }

        serde_json::from_str(trimmed).map_err(TcParseError::InvalidJson)
    }

    /// Serialise the TC into the JSON packet format accepted by [`Tc::from_json`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

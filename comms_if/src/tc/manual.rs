//! # Manual drive telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A direct drive or blade command.
///
/// Speeds are in drivetrain units, a signed value whose magnitude is limited by the
/// drivetrain's maximum speed. Positive speeds drive the wheel forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StructOpt)]
pub enum ManualCmd {
    /// Drive both wheels forwards at the same speed.
    #[structopt(name = "fwd")]
    Forward {
        speed: i32
    },

    /// Drive both wheels backwards at the same speed.
    #[structopt(name = "back")]
    Backward {
        speed: i32
    },

    /// Pivot on the spot to the left (anticlockwise seen from above).
    #[structopt(name = "left")]
    PivotLeft {
        speed: i32
    },

    /// Pivot on the spot to the right (clockwise seen from above).
    #[structopt(name = "right")]
    PivotRight {
        speed: i32
    },

    /// Set each wheel's speed independently.
    #[structopt(name = "tank")]
    Tank {
        #[structopt(allow_hyphen_values = true)]
        left: i32,

        #[structopt(allow_hyphen_values = true)]
        right: i32
    },

    /// Stop both wheels.
    #[structopt(name = "stop")]
    Stop,

    /// Start the cutting blade, unless the safety lock is engaged.
    #[structopt(name = "blade-on")]
    BladeOn,

    /// Stop the cutting blade.
    #[structopt(name = "blade-off")]
    BladeOff,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ManualCmd {
    /// The (left, right) wheel speeds requested by this command, or `None` for commands
    /// which don't move the wheels.
    pub fn wheel_speeds(&self) -> Option<(i32, i32)> {
        match *self {
            ManualCmd::Forward { speed } => Some((speed, speed)),
            ManualCmd::Backward { speed } => Some((-speed, -speed)),
            ManualCmd::PivotLeft { speed } => Some((-speed, speed)),
            ManualCmd::PivotRight { speed } => Some((speed, -speed)),
            ManualCmd::Tank { left, right } => Some((left, right)),
            ManualCmd::Stop => Some((0, 0)),
            ManualCmd::BladeOn | ManualCmd::BladeOff => None,
        }
    }
}

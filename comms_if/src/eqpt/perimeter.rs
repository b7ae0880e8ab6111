//! # Perimeter wire receiver status

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Status of the perimeter (boundary) wire receiver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryStatus {
    /// Position of the mower relative to the wire.
    pub zone: BoundaryZone,

    /// Strength of the received signal, higher is closer to the wire.
    ///
    /// Units: percent
    pub strength: f64,

    /// Side of the mower the wire is on.
    pub side: WireSide,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Position of the mower relative to the perimeter wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryZone {
    Inside,
    Outside,
    OnWire,
    NoSignal,
    /// The receiver itself is faulty.
    Fault,
}

/// Side of the mower the perimeter wire was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireSide {
    Left,
    Right,
    Center,
    Unknown,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BoundaryStatus {
    /// Status reported when no wire signal is being received.
    pub fn no_signal() -> Self {
        Self {
            zone: BoundaryZone::NoSignal,
            strength: 0.0,
            side: WireSide::Unknown,
        }
    }

    /// True if a usable wire signal is being received.
    pub fn has_signal(&self) -> bool {
        !matches!(self.zone, BoundaryZone::NoSignal | BoundaryZone::Fault)
    }

    /// True if the mower is outside the wire or sitting on it.
    pub fn is_breached(&self) -> bool {
        matches!(self.zone, BoundaryZone::Outside | BoundaryZone::OnWire)
    }
}

impl Default for BoundaryStatus {
    fn default() -> Self {
        Self::no_signal()
    }
}

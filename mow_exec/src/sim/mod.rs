//! # Simulated mower
//!
//! A kinematic differential-drive mower on a flat rectangular lawn, bounded by a perimeter
//! wire running along the lawn's edge and scattered with circular obstacles. The simulated
//! mower implements every equipment trait so the whole navigation core can run without
//! hardware.
//!
//! The lawn frame has X pointing east and Y pointing north, with the origin at the
//! south-west corner of the lawn. Headings follow the compass convention used everywhere
//! else.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

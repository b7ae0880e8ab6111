//! # Coverage planning module
//!
//! Plans a boustrophedon (back and forth) mowing pattern: straight parallel rows one row
//! width apart, alternating between a base heading and its reciprocal. With no wheel
//! encoders the distance along a row is estimated from the time spent on it, so each row
//! is also capped in time to bound the error of that estimate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod planner;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use planner::*;

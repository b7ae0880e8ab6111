//! # Communications interface crate.
//!
//! Provides the types exchanged between the mower's navigation core and everything around
//! it: telecommands in, telemetry out, and the samples read from the equipment.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands, instructions sent to the mower by an operator or a script
pub mod tc;

/// Telemetry, snapshots of the mower's status
pub mod tm;

/// Sample definitions for equipment (like the IMU or the perimeter receiver)
pub mod eqpt;

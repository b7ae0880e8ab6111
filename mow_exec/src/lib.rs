//! # Mower library.
//!
//! This library holds the mower's navigation core so that the executable, the benchmarks
//! and any other crate in the workspace can reach it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Battery status - voltage thresholds and state of charge
pub mod battery;

/// Coverage planner - boustrophedon row pattern over the lawn
pub mod coverage;

/// Data store - owns every module and runs one control cycle
pub mod data_store;

/// Equipment interfaces - the traits hardware (or the simulation) implements
pub mod eqpt;

/// Heading estimation - complementary filter over the inertial sensors
pub mod heading_est;

/// Mission manager - the top level state machine
pub mod mission;

/// Motion control - heading hold and turns over a differential drivetrain
pub mod motion_ctrl;

/// Obstacle avoidance - assessment of the ultrasonic range readings
pub mod obstacle;

/// Executable parameters
pub mod params;

/// Simulated mower - kinematic stand-in for the real equipment
pub mod sim;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Target period of one control cycle.
///
/// Units: seconds
pub const CYCLE_PERIOD_S: f64 = 0.05;

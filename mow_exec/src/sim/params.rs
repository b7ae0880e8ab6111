//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated mower and its lawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Lawn extent along X (east).
    ///
    /// Units: meters
    pub lawn_width_m: f64,

    /// Lawn extent along Y (north).
    ///
    /// Units: meters
    pub lawn_length_m: f64,

    /// Initial position of the mower in the lawn frame.
    ///
    /// Units: meters
    pub start_position_m: [f64; 2],

    /// Units: degrees
    pub start_heading_deg: f64,

    pub obstacles: Vec<SimObstacle>,

    // ---- DRIVETRAIN ----
    /// Ground speed produced by one unit of wheel speed demand.
    ///
    /// Units: meters/second
    pub speed_per_unit_ms: f64,

    /// Distance between the two drive wheels.
    ///
    /// Units: meters
    pub track_width_m: f64,

    // ---- SENSORS ----
    /// Angles of the left, middle and right range sensors from the mower's heading.
    ///
    /// Units: degrees
    pub range_angles_deg: [f64; 3],

    /// Units: centimeters
    pub range_max_cm: f64,

    /// Horizontal and vertical (downwards) components of the Earth's magnetic field.
    ///
    /// Units: microtesla
    pub mag_field_ut: [f64; 2],

    pub has_magnetometer: bool,

    /// Units: radians/second
    pub gyro_bias_rads: f64,

    /// Distance from the wire within which the receiver reports being on the wire.
    ///
    /// Units: meters
    pub on_wire_band_m: f64,

    /// Distance from the wire at which the signal strength falls to zero.
    ///
    /// Units: meters
    pub wire_signal_range_m: f64,

    // ---- NOISE ----
    /// Seed of the noise generator
    pub noise_seed: u32,

    /// Units: radians/second
    pub gyro_noise_rads: f64,

    /// Units: g
    pub accel_noise_g: f64,

    /// Units: microtesla
    pub mag_noise_ut: f64,

    /// Units: centimeters
    pub range_noise_cm: f64,

    // ---- POWER ----
    /// Units: volts
    pub battery_initial_v: f64,

    /// Battery drain while the wheels are driven.
    ///
    /// Units: volts/second
    pub drive_drain_vs: f64,

    /// Additional battery drain while the blade is running.
    ///
    /// Units: volts/second
    pub blade_drain_vs: f64,
}

/// A circular obstacle on the lawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimObstacle {
    /// Units: meters
    pub centre_m: [f64; 2],

    /// Units: meters
    pub radius_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            lawn_width_m: 10.0,
            lawn_length_m: 15.0,
            start_position_m: [2.0, 2.0],
            start_heading_deg: 0.0,
            obstacles: vec![
                SimObstacle { centre_m: [3.0, 8.0], radius_m: 0.4 },
                SimObstacle { centre_m: [7.0, 5.0], radius_m: 0.6 },
            ],
            speed_per_unit_ms: 0.001,
            track_width_m: 0.35,
            range_angles_deg: [-30.0, 0.0, 30.0],
            range_max_cm: 200.0,
            mag_field_ut: [20.0, 40.0],
            has_magnetometer: true,
            gyro_bias_rads: 0.002,
            on_wire_band_m: 0.05,
            wire_signal_range_m: 1.0,
            noise_seed: 0,
            gyro_noise_rads: 0.001,
            accel_noise_g: 0.005,
            mag_noise_ut: 0.2,
            range_noise_cm: 0.5,
            battery_initial_v: 12.6,
            drive_drain_vs: 0.0005,
            blade_drain_vs: 0.0005,
        }
    }
}

//! # Mower telemetry
//!
//! The telemetry snapshot is flat (no nested structures) so that it can be written
//! directly as a CSV record as well as sent as JSON.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Snapshot of the mower's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MowerTm {
    pub timestamp: DateTime<Utc>,

    /// Seconds since the start of the session
    pub elapsed_s: f64,

    // ---- MISSION ----
    pub state: String,
    pub previous_state: String,
    pub time_in_state_s: f64,
    pub last_error: Option<String>,

    // ---- ORIENTATION ----
    pub heading_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub target_heading_deg: f64,
    pub tilted: bool,
    pub gyro_calibrated: bool,

    // ---- OBSTACLES ----
    pub dist_left_cm: f64,
    pub dist_middle_cm: f64,
    pub dist_right_cm: f64,
    pub obstacle: bool,
    pub obstacle_critical: bool,
    pub avoid_direction: Option<String>,

    // ---- DRIVE ----
    pub left_speed: i32,
    pub right_speed: i32,
    pub motion_mode: String,

    // ---- POWER ----
    pub battery_v: f64,
    pub battery_pct: f64,
    pub battery_low: bool,

    // ---- CUTTING ----
    pub cutting: bool,
    pub safety_locked: bool,

    // ---- PERIMETER ----
    pub boundary_zone: String,
    pub boundary_signal: bool,
    pub boundary_strength: f64,
    pub boundary_side: String,

    // ---- COVERAGE ----
    pub row: u32,
    pub total_rows: u32,
    pub pattern_complete: bool,
}

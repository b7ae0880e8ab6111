//! # Battery status
//!
//! Derives the low and critical flags and a state of charge from the measured voltage.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Battery voltage thresholds.
///
/// Units: volts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryParams {
    /// Under this the mower returns to base
    pub low_v: f64,

    /// Under this the mower stops with an error
    pub critical_v: f64,

    /// Voltage of a fully charged battery, 100 %
    pub full_v: f64,

    /// Voltage of an empty battery, 0 %
    pub empty_v: f64,
}

/// Battery status derived from one voltage measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BatteryStatus {
    /// Units: volts
    pub voltage_v: f64,

    /// Units: percent
    pub percent: f64,

    pub low: bool,

    pub critical: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for BatteryParams {
    fn default() -> Self {
        Self {
            low_v: 10.5,
            critical_v: 10.0,
            full_v: 12.6,
            empty_v: 9.0,
        }
    }
}

impl BatteryStatus {

    /// Assess a voltage measurement.
    ///
    /// A voltage of zero or less is a failed measurement, it is never low nor critical.
    pub fn from_voltage(voltage_v: f64, params: &BatteryParams) -> Self {
        if !voltage_v.is_finite() || voltage_v <= 0.0 {
            return Self::default();
        }

        let percent = lin_map((params.empty_v, params.full_v), (0.0, 100.0), voltage_v)
            .max(0.0)
            .min(100.0);

        Self {
            voltage_v,
            percent,
            low: voltage_v < params.low_v,
            critical: voltage_v < params.critical_v,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

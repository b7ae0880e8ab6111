//! General time utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Slack allowed when comparing times accumulated from floating point cycle periods.
///
/// Units: seconds
const CADENCE_SLACK_S: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A software timer which fires at a fixed period.
///
/// Cadences let several subsystems share one cyclic loop while each runs at its own rate.
/// A cadence is due on its first check, after which it fires once every `period_s`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Cadence {
    /// Period between firings.
    ///
    /// Units: seconds
    period_s: f64,

    #[serde(skip)]
    last_fire_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Cadence {
    /// Create a new cadence with the given period.
    pub fn new(period_s: f64) -> Self {
        Self {
            period_s,
            last_fire_s: None
        }
    }

    /// Returns true if the cadence is due at `now_s`, marking it as fired if so.
    pub fn is_due(&mut self, now_s: f64) -> bool {
        match self.last_fire_s {
            Some(t) if now_s - t < self.period_s - CADENCE_SLACK_S => false,
            _ => {
                self.last_fire_s = Some(now_s);
                true
            }
        }
    }

    /// Time since the cadence last fired, or `None` if it never has.
    pub fn since_last_s(&self, now_s: f64) -> Option<f64> {
        self.last_fire_s.map(|t| now_s - t)
    }

    /// Period of the cadence in seconds.
    pub fn period_s(&self) -> f64 {
        self.period_s
    }

    /// Forget the last firing so the cadence is due again immediately.
    pub fn reset(&mut self) {
        self.last_fire_s = None;
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

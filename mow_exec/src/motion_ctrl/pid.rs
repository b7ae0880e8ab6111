//! # Heading PID controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller evaluated once per control tick.
///
/// The integral and derivative terms are per tick rather than per second, the gains are
/// tuned for the fixed control period.
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Symmetric bound on the integral accumulation
    integral_limit: f64,

    /// Previous error
    prev_error: f64,

    /// The integral accumulation
    integral: f64
}

/// The individual terms of the last controller evaluation.
#[derive(Debug, Serialize, Clone, Copy, Default)]
pub struct PidTerms {
    pub p: f64,
    pub i: f64,
    pub d: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains and integral bound.
    pub fn new(k_p: f64, k_i: f64, k_d: f64, integral_limit: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            integral_limit: integral_limit.abs(),
            prev_error: 0f64,
            integral: 0f64
        }
    }

    /// Get the value of the controller for the given error.
    pub fn get(&mut self, error: f64) -> f64 {
        let terms = self.get_terms(error);
        terms.p + terms.i + terms.d
    }

    /// Evaluate the controller, returning each term separately.
    pub fn get_terms(&mut self, error: f64) -> PidTerms {
        // Anti-windup
        self.integral = (self.integral + error)
            .max(-self.integral_limit)
            .min(self.integral_limit);

        let deriv = error - self.prev_error;
        self.prev_error = error;

        PidTerms {
            p: self.k_p * error,
            i: self.k_i * self.integral,
            d: self.k_d * deriv
        }
    }

    /// Clear the integral and previous error.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = 0f64;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }

    pub fn integral_limit(&self) -> f64 {
        self.integral_limit
    }
}

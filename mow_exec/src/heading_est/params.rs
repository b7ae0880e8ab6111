//! Parameters structure for HeadingEst

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for heading estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingEstParams {

    // ---- FILTERS ----

    /// Coefficient of the single pole accelerometer low-pass filter, the weight given to each
    /// new sample.
    pub acc_lpf_alpha: f64,

    /// Complementary filter weight of the gyro-integrated heading. The magnetic heading
    /// gets `1 - complementary_alpha`.
    pub complementary_alpha: f64,

    /// Time step used when the caller provides one outside `(0, 1]`.
    ///
    /// Units: seconds
    pub default_dt_s: f64,

    // ---- CALIBRATION ----

    /// Number of stationary samples averaged during gyro calibration.
    pub gyro_calib_samples: usize,

    /// Magnetic declination added to the magnetic heading.
    ///
    /// Units: degrees
    pub declination_deg: f64,

    /// Magnetometer hard iron offset, subtracted from each raw reading.
    ///
    /// Units: microtesla
    pub mag_hard_iron_ut: [f64; 3],

    /// Magnetometer soft iron scale, applied after the hard iron offset.
    pub mag_soft_iron_scale: [f64; 3],

    /// Minimum half-range a horizontal axis must show for a magnetometer calibration to be
    /// accepted.
    ///
    /// Units: microtesla
    pub mag_calib_min_half_range_ut: f64,

    // ---- ADAPTIVE BIAS ----

    /// Let the gyro Z bias track the raw rate while the mower is stationary.
    pub adaptive_bias_enabled: bool,

    /// Weight of each new sample in the adaptive bias average.
    pub adaptive_bias_rate: f64,

    /// Rates above this are treated as real motion and never adapted into the bias.
    ///
    /// Units: radians/second
    pub stationary_rate_limit_rads: f64,

    // ---- EXTERNAL HEADING ----

    /// Blend headings supplied by wheel odometry into the estimate.
    pub encoder_fusion_enabled: bool,

    /// Confidence given to odometry headings when fusion is enabled, in `[0, 1]`.
    pub encoder_confidence: f64,

    // ---- TILT ----

    /// Pitch or roll magnitude beyond which the mower is considered tilted.
    ///
    /// Units: degrees
    pub tilt_threshold_deg: f64,
}

impl Default for HeadingEstParams {
    fn default() -> Self {
        Self {
            acc_lpf_alpha: 0.1,
            complementary_alpha: 0.98,
            default_dt_s: 0.01,
            gyro_calib_samples: 100,
            declination_deg: 0.0,
            mag_hard_iron_ut: [0.0; 3],
            mag_soft_iron_scale: [1.0; 3],
            mag_calib_min_half_range_ut: 1.0,
            adaptive_bias_enabled: true,
            adaptive_bias_rate: 0.05,
            stationary_rate_limit_rads: 0.02,
            encoder_fusion_enabled: false,
            encoder_confidence: 0.1,
            tilt_threshold_deg: 45.0,
        }
    }
}

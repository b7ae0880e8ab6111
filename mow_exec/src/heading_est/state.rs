//! Implementations for the HeadingEstimator state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{GyroCalibration, HeadingEstError, HeadingEstParams, MagCalibration, MagCorrection};
use crate::eqpt::InertialSource;
use comms_if::eqpt::imu::ImuSample;
use util::maths::{ang_diff_deg, blend_angle_deg, norm_angle_deg};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Heading estimator state.
#[derive(Debug, Clone)]
pub struct HeadingEstimator {
    params: HeadingEstParams,

    // ---- CALIBRATION ----
    gyro_bias_rads: Vector3<f64>,
    gyro_calibrated: bool,
    mag_correction: MagCorrection,
    declination_deg: f64,

    /// Weight of the gyro-integrated heading in the complementary filter
    alpha: f64,

    encoder_fusion_enabled: bool,

    /// Set by the owner while no motion is commanded, enables adaptive bias tracking
    stationary: bool,

    gyro_calib: Option<GyroCalibration>,
    mag_calib: Option<MagCalibration>,

    // ---- ESTIMATE ----
    acc_filt_g: Vector3<f64>,

    /// Fused heading before the reference offset is removed
    heading_deg: f64,

    heading_offset_deg: f64,
    pitch_deg: f64,
    roll_deg: f64,

    /// Last tilt-compensated magnetic heading
    mag_heading_deg: Option<f64>,

    mag_present: bool,

    report: StatusReport,
}

/// Status report for heading estimation.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// Number of successful updates
    pub num_updates: u64,

    /// Number of updates with no usable sample
    pub num_failed_updates: u64,

    /// True if the last update fused a magnetic heading
    pub mag_fused: bool,

    /// True if the last update was given an invalid time step
    pub dt_replaced: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HeadingEstimator {

    /// Create a new estimator from the given parameters.
    ///
    /// The gyro bias starts at zero, calibrate before relying on the heading.
    pub fn new(params: HeadingEstParams) -> Self {
        Self {
            gyro_bias_rads: Vector3::zeros(),
            gyro_calibrated: false,
            mag_correction: MagCorrection {
                hard_iron_ut: Vector3::from(params.mag_hard_iron_ut),
                soft_iron_scale: Vector3::from(params.mag_soft_iron_scale),
            },
            declination_deg: params.declination_deg,
            alpha: params.complementary_alpha.max(0.0).min(1.0),
            encoder_fusion_enabled: params.encoder_fusion_enabled,
            stationary: false,
            gyro_calib: None,
            mag_calib: None,
            // Level and stationary
            acc_filt_g: Vector3::new(0.0, 0.0, 1.0),
            heading_deg: 0.0,
            heading_offset_deg: 0.0,
            pitch_deg: 0.0,
            roll_deg: 0.0,
            mag_heading_deg: None,
            mag_present: false,
            report: StatusReport::default(),
            params,
        }
    }

    /// Create a new estimator loading parameters from the given parameter file.
    pub fn init(params_path: &str) -> Result<Self, HeadingEstError> {
        let params = util::params::load(params_path).map_err(HeadingEstError::ParamLoadError)?;

        Ok(Self::new(params))
    }

    /// Read a sample from `source` and advance the estimate by `dt_s` seconds.
    ///
    /// A `dt_s` outside `(0, 1]` is replaced by the default time step. If no sample can be
    /// read the estimate is left untouched and the error returned, the caller should treat
    /// this as "no new information" and try again next cycle.
    pub fn update<S>(&mut self, source: &mut S, dt_s: f64) -> Result<(), HeadingEstError>
    where
        S: InertialSource + ?Sized
    {
        let sample = match source.read_inertial() {
            Ok(s) => s,
            Err(e) => {
                self.report.num_failed_updates += 1;
                return Err(HeadingEstError::SampleUnavailable(e));
            }
        };

        self.mag_present = source.has_magnetometer();

        self.update_with_sample(&sample, dt_s)
    }

    /// Advance the estimate with an already acquired sample.
    pub fn update_with_sample(
        &mut self,
        sample: &ImuSample,
        dt_s: f64
    ) -> Result<(), HeadingEstError> {
        let finite = sample.accel_g.iter()
            .chain(sample.gyro_rads.iter())
            .all(|v| v.is_finite());

        if !finite {
            self.report.num_failed_updates += 1;
            return Err(HeadingEstError::InvalidSample);
        }

        self.report.dt_replaced = !(dt_s.is_finite() && dt_s > 0.0 && dt_s <= 1.0);
        let dt_s = if self.report.dt_replaced {
            self.params.default_dt_s
        }
        else {
            dt_s
        };

        // ---- ATTITUDE ----

        let acc_g = Vector3::from(sample.accel_g);
        self.acc_filt_g += (acc_g - self.acc_filt_g) * self.params.acc_lpf_alpha;

        let roll_rad = self.acc_filt_g.y.atan2(self.acc_filt_g.z);
        let pitch_rad = (-self.acc_filt_g.x).atan2(
            (self.acc_filt_g.y.powi(2) + self.acc_filt_g.z.powi(2)).sqrt()
        );
        self.roll_deg = roll_rad.to_degrees();
        self.pitch_deg = pitch_rad.to_degrees();

        // ---- GYRO ----

        let gyro_rads = Vector3::from(sample.gyro_rads);

        // While calibrating the mower is stationary, gather the sample instead of integrating
        if let Some(ref mut calib) = self.gyro_calib {
            calib.add(gyro_rads);
            if calib.is_complete() {
                self.finish_gyro_calibration();
            }
            self.report.mag_fused = false;
            self.report.num_updates += 1;
            return Ok(());
        }

        if self.stationary
            && self.params.adaptive_bias_enabled
            && (gyro_rads.z - self.gyro_bias_rads.z).abs() < self.params.stationary_rate_limit_rads
        {
            let r = self.params.adaptive_bias_rate;
            self.gyro_bias_rads.z = (1.0 - r) * self.gyro_bias_rads.z + r * gyro_rads.z;
        }

        let rate_rads = gyro_rads - self.gyro_bias_rads;
        let yaw_gyro_deg = norm_angle_deg(self.heading_deg + rate_rads.z.to_degrees() * dt_s);

        // ---- MAGNETOMETER ----

        let mag_ut = match sample.mag_ut {
            Some(m) if self.mag_present && m.iter().all(|v| v.is_finite()) => {
                Some(Vector3::from(m))
            },
            _ => None
        };

        match mag_ut {
            Some(m) => {
                if let Some(ref mut calib) = self.mag_calib {
                    calib.add(m);
                }

                let yaw_mag_deg = self.mag_yaw_deg(&m, roll_rad, pitch_rad);
                self.mag_heading_deg = Some(yaw_mag_deg);

                // Complementary filter along the shortest arc
                self.heading_deg = blend_angle_deg(yaw_gyro_deg, yaw_mag_deg, 1.0 - self.alpha);
                self.report.mag_fused = true;
            },
            None => {
                self.heading_deg = yaw_gyro_deg;
                self.report.mag_fused = false;
            }
        }

        self.report.num_updates += 1;

        trace!(
            "HeadingEst: heading {:.2} deg, pitch {:.2} deg, roll {:.2} deg, mag {:?}",
            self.heading_deg(),
            self.pitch_deg,
            self.roll_deg,
            self.mag_heading_deg
        );

        Ok(())
    }

    /// Calibrate the gyro bias by averaging `sample_count` samples read from `source`.
    ///
    /// The mower must be stationary for the whole call. Failed reads are skipped, at most
    /// `2 * sample_count` reads are attempted. Blocks for as long as the reads take, use
    /// [`HeadingEstimator::begin_gyro_calibration`] to calibrate from the cyclic updates
    /// instead.
    pub fn calibrate_gyro<S>(
        &mut self,
        source: &mut S,
        sample_count: usize
    ) -> Result<Vector3<f64>, HeadingEstError>
    where
        S: InertialSource + ?Sized
    {
        let mut calib = GyroCalibration::new(sample_count);
        let max_attempts = 2 * calib.target_samples();

        for _ in 0..max_attempts {
            if calib.is_complete() {
                break;
            }

            match source.read_inertial() {
                Ok(s) if s.gyro_rads.iter().all(|v| v.is_finite()) => {
                    calib.add(Vector3::from(s.gyro_rads))
                },
                Ok(_) => debug!("Skipping non-finite gyro sample during calibration"),
                Err(e) => debug!("Skipping failed read during gyro calibration: {}", e),
            }
        }

        let bias = calib
            .mean()
            .ok_or(HeadingEstError::GyroCalibrationFailed(sample_count))?;

        if !calib.is_complete() {
            warn!(
                "Gyro calibration only gathered {} of {} samples",
                calib.num_samples(),
                calib.target_samples()
            );
        }

        self.set_gyro_bias(bias);

        Ok(bias)
    }

    /// Start gathering `sample_count` gyro samples from subsequent updates.
    ///
    /// Heading integration is suspended until the calibration completes.
    pub fn begin_gyro_calibration(&mut self, sample_count: usize) {
        info!("Gyro calibration started ({} samples), keep the mower still", sample_count);
        self.gyro_calib = Some(GyroCalibration::new(sample_count));
    }

    /// Abandon a running gyro calibration, keeping the previous bias.
    pub fn cancel_gyro_calibration(&mut self) {
        if self.gyro_calib.take().is_some() {
            warn!("Gyro calibration cancelled");
        }
    }

    pub fn is_calibrating_gyro(&self) -> bool {
        self.gyro_calib.is_some()
    }

    /// Start tracking the magnetometer extremes. The mower should rotate at least once
    /// before [`HeadingEstimator::finish_mag_calibration`] is called.
    pub fn begin_mag_calibration(&mut self) -> Result<(), HeadingEstError> {
        if !self.mag_present {
            return Err(HeadingEstError::NoMagnetometer);
        }

        info!("Magnetometer calibration started, rotate the mower");
        self.mag_calib = Some(MagCalibration::new());

        Ok(())
    }

    /// Solve and apply the magnetometer calibration.
    ///
    /// On failure the previous correction is kept.
    pub fn finish_mag_calibration(&mut self) -> Result<MagCorrection, HeadingEstError> {
        let calib = self
            .mag_calib
            .take()
            .ok_or(HeadingEstError::MagCalibrationNotStarted)?;

        let correction = calib.solve(self.params.mag_calib_min_half_range_ut)?;

        info!(
            "Magnetometer calibrated from {} samples: hard iron {:?} uT, soft iron {:?}",
            calib.num_samples(),
            correction.hard_iron_ut.as_slice(),
            correction.soft_iron_scale.as_slice()
        );
        self.mag_correction = correction;

        Ok(correction)
    }

    /// Abandon a running magnetometer calibration, keeping the previous correction.
    pub fn cancel_mag_calibration(&mut self) {
        if self.mag_calib.take().is_some() {
            warn!("Magnetometer calibration cancelled");
        }
    }

    pub fn is_calibrating_mag(&self) -> bool {
        self.mag_calib.is_some()
    }

    /// Blend a heading from another source (such as wheel odometry) into the estimate.
    ///
    /// `heading_deg` is in the same reference as [`HeadingEstimator::heading_deg`]. The
    /// estimate moves along the shortest arc by a fraction `confidence` (clamped to
    /// `[0, 1]`) of the difference. Returns false, leaving the estimate unchanged, if fusion
    /// is disabled or the heading is not finite.
    pub fn fuse_external_heading(&mut self, heading_deg: f64, confidence: f64) -> bool {
        if !self.encoder_fusion_enabled || !heading_deg.is_finite() || !confidence.is_finite() {
            return false;
        }

        let confidence = confidence.max(0.0).min(1.0);
        let target_deg = heading_deg + self.heading_offset_deg;

        self.heading_deg = blend_angle_deg(self.heading_deg, target_deg, confidence);

        true
    }

    pub fn set_encoder_fusion_enabled(&mut self, enabled: bool) {
        self.encoder_fusion_enabled = enabled;
    }

    pub fn is_encoder_fusion_enabled(&self) -> bool {
        self.encoder_fusion_enabled
    }

    /// Make the current heading the zero reference.
    pub fn reset_heading(&mut self) {
        self.heading_offset_deg = self.heading_deg;
        info!("Heading reference reset ({:.2} deg is now 0 deg)", self.heading_offset_deg);
    }

    /// Set the complementary filter gyro weight, clamped to `[0, 1]`.
    pub fn set_alpha(&mut self, alpha: f64) {
        if alpha.is_finite() {
            self.alpha = alpha.max(0.0).min(1.0);
        }
    }

    pub fn set_declination(&mut self, declination_deg: f64) {
        if declination_deg.is_finite() {
            self.declination_deg = declination_deg;
        }
    }

    /// Set the magnetometer hard iron offset and soft iron scale.
    pub fn set_mag_calibration(&mut self, hard_iron_ut: [f64; 3], soft_iron_scale: [f64; 3]) {
        self.mag_correction = MagCorrection {
            hard_iron_ut: Vector3::from(hard_iron_ut),
            soft_iron_scale: Vector3::from(soft_iron_scale),
        };
    }

    pub fn set_gyro_bias(&mut self, bias_rads: Vector3<f64>) {
        self.gyro_bias_rads = bias_rads;
        self.gyro_calibrated = true;
        info!(
            "Gyro bias set to [{:.5}, {:.5}, {:.5}] rad/s",
            bias_rads.x, bias_rads.y, bias_rads.z
        );
    }

    /// Tell the estimator whether the mower is commanded to be stationary.
    pub fn set_stationary(&mut self, stationary: bool) {
        self.stationary = stationary;
    }

    /// Fused heading relative to the reference, in `[0, 360)`.
    ///
    /// Units: degrees
    pub fn heading_deg(&self) -> f64 {
        norm_angle_deg(self.heading_deg - self.heading_offset_deg)
    }

    /// Units: degrees
    pub fn pitch_deg(&self) -> f64 {
        self.pitch_deg
    }

    /// Units: degrees
    pub fn roll_deg(&self) -> f64 {
        self.roll_deg
    }

    /// Last magnetic heading, relative to the reference.
    pub fn mag_heading_deg(&self) -> Option<f64> {
        self.mag_heading_deg
            .map(|h| norm_angle_deg(h - self.heading_offset_deg))
    }

    pub fn gyro_bias_rads(&self) -> Vector3<f64> {
        self.gyro_bias_rads
    }

    pub fn is_gyro_calibrated(&self) -> bool {
        self.gyro_calibrated
    }

    /// True if the last inertial source read reported a magnetometer.
    pub fn has_magnetometer(&self) -> bool {
        self.mag_present
    }

    /// True if pitch or roll exceed the tilt threshold.
    pub fn is_tilted(&self) -> bool {
        exceeds_tilt(self.pitch_deg, self.roll_deg, self.params.tilt_threshold_deg)
    }

    pub fn tilt_threshold_deg(&self) -> f64 {
        self.params.tilt_threshold_deg
    }

    pub fn params(&self) -> &HeadingEstParams {
        &self.params
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Absolute difference between the fused and magnetic headings, `None` without a
    /// magnetometer.
    pub fn mag_disagreement_deg(&self) -> Option<f64> {
        self.mag_heading_deg
            .map(|m| ang_diff_deg(self.heading_deg, m).abs())
    }

    fn finish_gyro_calibration(&mut self) {
        if let Some(calib) = self.gyro_calib.take() {
            match calib.mean() {
                Some(bias) => {
                    info!("Gyro calibration complete ({} samples)", calib.num_samples());
                    self.set_gyro_bias(bias);
                },
                None => warn!("Gyro calibration finished without samples, bias unchanged"),
            }
        }
    }

    /// Tilt-compensated magnetic heading including declination.
    fn mag_yaw_deg(&self, raw_ut: &Vector3<f64>, roll_rad: f64, pitch_rad: f64) -> f64 {
        let m = (raw_ut - self.mag_correction.hard_iron_ut)
            .component_mul(&self.mag_correction.soft_iron_scale);

        let (sin_r, cos_r) = roll_rad.sin_cos();
        let (sin_p, cos_p) = pitch_rad.sin_cos();

        // Rotate the body frame field back onto the horizontal plane
        let mx_h = m.x * cos_p + (m.y * sin_r + m.z * cos_r) * sin_p;
        let my_h = m.y * cos_r - m.z * sin_r;

        norm_angle_deg((-my_h).atan2(mx_h).to_degrees() + self.declination_deg)
    }
}

impl Default for HeadingEstimator {
    fn default() -> Self {
        Self::new(HeadingEstParams::default())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// True if the magnitude of pitch or roll exceeds `threshold_deg`.
pub fn exceeds_tilt(pitch_deg: f64, roll_deg: f64, threshold_deg: f64) -> bool {
    pitch_deg.abs() > threshold_deg || roll_deg.abs() > threshold_deg
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::eqpt::EqptError;

    /// Field strength used by the test magnetometer, horizontal and vertical components.
    const B_H_UT: f64 = 20.0;
    const B_V_UT: f64 = 40.0;

    struct TestImu {
        sample: ImuSample,
        has_mag: bool,
        fail: bool,
        reads: usize,
    }

    impl TestImu {
        fn level(heading_deg: f64, gyro_z_rads: f64, has_mag: bool) -> Self {
            Self {
                sample: ImuSample {
                    accel_g: [0.0, 0.0, 1.0],
                    gyro_rads: [0.0, 0.0, gyro_z_rads],
                    mag_ut: if has_mag { Some(mag_for(heading_deg)) } else { None },
                },
                has_mag,
                fail: false,
                reads: 0,
            }
        }
    }

    impl InertialSource for TestImu {
        fn read_inertial(&mut self) -> Result<ImuSample, EqptError> {
            self.reads += 1;
            if self.fail {
                Err(EqptError::NoResponse("IMU"))
            }
            else {
                Ok(self.sample)
            }
        }

        fn has_magnetometer(&self) -> bool {
            self.has_mag
        }
    }

    /// Body frame field seen by a level mower at the given heading.
    fn mag_for(heading_deg: f64) -> [f64; 3] {
        let h = heading_deg.to_radians();
        [B_H_UT * h.cos(), -B_H_UT * h.sin(), B_V_UT]
    }

    #[test]
    fn test_converges_to_mag_heading() {
        let mut est = HeadingEstimator::default();
        let mut imu = TestImu::level(120.0, 0.0, true);

        let mut prev_err = 360.0;
        for i in 0..600 {
            est.update(&mut imu, 0.05).unwrap();

            let h = est.heading_deg();
            assert!(h >= 0.0 && h < 360.0);

            let err = ang_diff_deg(h, 120.0).abs();
            assert!(err <= prev_err + 1e-9, "error grew at tick {}", i);
            prev_err = err;
        }

        assert!(prev_err < 0.1, "heading did not converge, error {}", prev_err);
        assert!(est.report().mag_fused);
    }

    #[test]
    fn test_blend_across_north() {
        let mut est = HeadingEstimator::default();

        // Settle on 350 deg, then the magnetic heading moves to 10 deg
        let mut imu = TestImu::level(350.0, 0.0, true);
        for _ in 0..1000 {
            est.update(&mut imu, 0.05).unwrap();
        }
        assert!(ang_diff_deg(est.heading_deg(), 350.0).abs() < 0.1);

        imu.sample.mag_ut = Some(mag_for(10.0));
        for _ in 0..50 {
            est.update(&mut imu, 0.05).unwrap();
            let h = est.heading_deg();
            // Must travel through north, never through south
            assert!(h >= 349.9 || h <= 10.1, "heading swung to {}", h);
        }
    }

    #[test]
    fn test_gyro_only_integration() {
        let mut est = HeadingEstimator::default();
        let mut imu = TestImu::level(0.0, 10f64.to_radians(), false);

        for _ in 0..100 {
            est.update(&mut imu, 0.1).unwrap();
        }

        // 10 deg/s for 10 s
        assert!((est.heading_deg() - 100.0).abs() < 1e-6);
        assert!(!est.report().mag_fused);
    }

    #[test]
    fn test_invalid_dt_replaced() {
        let mut est = HeadingEstimator::default();
        let mut imu = TestImu::level(0.0, 1.0, false);

        est.update(&mut imu, 5.0).unwrap();
        assert!(est.report().dt_replaced);
        assert!((est.heading_deg() - 1f64.to_degrees() * 0.01).abs() < 1e-9);

        est.update(&mut imu, -1.0).unwrap();
        est.update(&mut imu, std::f64::NAN).unwrap();
        assert!((est.heading_deg() - 3.0 * 1f64.to_degrees() * 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_failed_read_keeps_last_values() {
        let mut est = HeadingEstimator::default();
        let mut imu = TestImu::level(0.0, 0.2, false);

        for _ in 0..10 {
            est.update(&mut imu, 0.05).unwrap();
        }
        let heading = est.heading_deg();
        let pitch = est.pitch_deg();

        imu.fail = true;
        assert!(matches!(
            est.update(&mut imu, 0.05),
            Err(HeadingEstError::SampleUnavailable(_))
        ));
        assert_eq!(est.heading_deg(), heading);
        assert_eq!(est.pitch_deg(), pitch);
        assert_eq!(est.report().num_failed_updates, 1);
    }

    #[test]
    fn test_calibrate_gyro() {
        let mut est = HeadingEstimator::default();
        let mut imu = TestImu::level(0.0, 0.015, false);

        let bias = est.calibrate_gyro(&mut imu, 50).unwrap();
        assert!((bias.z - 0.015).abs() < 1e-12);
        assert_eq!(imu.reads, 50);
        assert!(est.is_gyro_calibrated());

        // Bias removed, stationary heading no longer drifts
        est.set_stationary(false);
        for _ in 0..100 {
            est.update(&mut imu, 0.05).unwrap();
        }
        assert!(ang_diff_deg(est.heading_deg(), 0.0).abs() < 1e-9);

        imu.fail = true;
        assert!(matches!(
            est.calibrate_gyro(&mut imu, 10),
            Err(HeadingEstError::GyroCalibrationFailed(10))
        ));
    }

    #[test]
    fn test_incremental_gyro_calibration() {
        let mut est = HeadingEstimator::default();
        let mut imu = TestImu::level(0.0, 0.01, false);

        est.begin_gyro_calibration(20);
        for _ in 0..19 {
            est.update(&mut imu, 0.05).unwrap();
            assert!(est.is_calibrating_gyro());
        }
        est.update(&mut imu, 0.05).unwrap();

        assert!(!est.is_calibrating_gyro());
        assert!((est.gyro_bias_rads().z - 0.01).abs() < 1e-12);
        // No integration happened during calibration
        assert_eq!(est.heading_deg(), 0.0);
    }

    #[test]
    fn test_adaptive_bias() {
        let mut est = HeadingEstimator::default();
        let mut imu = TestImu::level(0.0, 0.01, false);

        est.set_stationary(true);
        for _ in 0..500 {
            est.update(&mut imu, 0.05).unwrap();
        }
        assert!((est.gyro_bias_rads().z - 0.01).abs() < 1e-6);

        // Real rotation is not absorbed into the bias
        let bias = est.gyro_bias_rads().z;
        imu.sample.gyro_rads[2] = 0.5;
        est.update(&mut imu, 0.05).unwrap();
        assert_eq!(est.gyro_bias_rads().z, bias);
    }

    #[test]
    fn test_reset_heading() {
        let mut est = HeadingEstimator::default();
        let mut imu = TestImu::level(0.0, 45f64.to_radians(), false);

        est.update(&mut imu, 1.0).unwrap();
        assert!((est.heading_deg() - 45.0).abs() < 1e-9);

        est.reset_heading();
        assert_eq!(est.heading_deg(), 0.0);

        est.update(&mut imu, 1.0).unwrap();
        assert!((est.heading_deg() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_external_heading_fusion() {
        let mut est = HeadingEstimator::default();

        assert!(!est.fuse_external_heading(90.0, 1.0));
        assert_eq!(est.heading_deg(), 0.0);

        est.set_encoder_fusion_enabled(true);
        assert!(est.fuse_external_heading(350.0, 0.5));
        assert!((est.heading_deg() - 355.0).abs() < 1e-9);

        // Confidence is clamped
        assert!(est.fuse_external_heading(10.0, 7.0));
        assert!((est.heading_deg() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_tilt() {
        assert!(exceeds_tilt(50.0, 0.0, 45.0));
        assert!(exceeds_tilt(0.0, -46.0, 45.0));
        assert!(!exceeds_tilt(10.0, 10.0, 45.0));

        // Pitched nose-up by 50 degrees
        let mut est = HeadingEstimator::default();
        let p = 50f64.to_radians();
        let mut imu = TestImu::level(0.0, 0.0, false);
        imu.sample.accel_g = [-p.sin(), 0.0, p.cos()];

        for _ in 0..200 {
            est.update(&mut imu, 0.05).unwrap();
        }
        assert!((est.pitch_deg() - 50.0).abs() < 0.01);
        assert!(est.is_tilted());
    }

    #[test]
    fn test_tilt_compensated_mag_heading() {
        // Rolled 20 deg, pitched 10 deg, facing 60 deg
        let (heading, roll, pitch) = (60f64.to_radians(), 20f64.to_radians(), 10f64.to_radians());

        // Earth field (north, east, down) rotated into the body frame
        let n = nalgebra::Vector3::new(B_H_UT, 0.0, B_V_UT);
        let rot = nalgebra::Rotation3::from_euler_angles(roll, pitch, heading);
        let body = rot.inverse() * n;
        let grav = rot.inverse() * nalgebra::Vector3::new(0.0, 0.0, 1.0);

        let mut imu = TestImu::level(0.0, 0.0, true);
        imu.sample.accel_g = [grav.x, grav.y, grav.z];
        imu.sample.mag_ut = Some([body.x, body.y, body.z]);

        let mut est = HeadingEstimator::default();
        for _ in 0..400 {
            est.update(&mut imu, 0.05).unwrap();
        }

        assert!((est.roll_deg() - 20.0).abs() < 0.01);
        assert!((est.pitch_deg() - 10.0).abs() < 0.01);
        assert!(ang_diff_deg(est.mag_heading_deg().unwrap(), 60.0).abs() < 0.01);
    }

    #[test]
    fn test_mag_calibration_requires_magnetometer() {
        let mut est = HeadingEstimator::default();
        let mut imu = TestImu::level(0.0, 0.0, false);
        est.update(&mut imu, 0.05).unwrap();

        assert!(matches!(est.begin_mag_calibration(), Err(HeadingEstError::NoMagnetometer)));
        assert!(matches!(
            est.finish_mag_calibration(),
            Err(HeadingEstError::MagCalibrationNotStarted)
        ));
    }

    #[test]
    fn test_mag_calibration_from_updates() {
        let mut est = HeadingEstimator::default();
        let mut imu = TestImu::level(0.0, 0.0, true);
        est.update(&mut imu, 0.05).unwrap();

        est.begin_mag_calibration().unwrap();
        for deg in 0..360 {
            let m = mag_for(deg as f64);
            imu.sample.mag_ut = Some([m[0] + 5.0, m[1] - 3.0, m[2]]);
            est.update(&mut imu, 0.05).unwrap();
        }

        let corr = est.finish_mag_calibration().unwrap();
        assert!((corr.hard_iron_ut.x - 5.0).abs() < 1e-6);
        assert!((corr.hard_iron_ut.y + 3.0).abs() < 1e-6);
        assert!(!est.is_calibrating_mag());
    }
}

//! Sensor calibration accumulators
//!
//! Both calibrations gather samples across many cycles so that calibrating never stalls the
//! main loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;

use super::HeadingEstError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Running mean of stationary gyro samples.
#[derive(Debug, Clone)]
pub struct GyroCalibration {
    target_samples: usize,
    sum_rads: Vector3<f64>,
    num_samples: usize,
}

/// Per-axis extremes of the raw magnetometer reading while the mower rotates.
#[derive(Debug, Clone)]
pub struct MagCalibration {
    min_ut: Vector3<f64>,
    max_ut: Vector3<f64>,
    num_samples: usize,
}

/// Result of a magnetometer calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagCorrection {
    /// Hard iron offset.
    ///
    /// Units: microtesla
    pub hard_iron_ut: Vector3<f64>,

    /// Soft iron scale factors.
    pub soft_iron_scale: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GyroCalibration {
    pub fn new(target_samples: usize) -> Self {
        Self {
            target_samples: target_samples.max(1),
            sum_rads: Vector3::zeros(),
            num_samples: 0,
        }
    }

    pub fn add(&mut self, gyro_rads: Vector3<f64>) {
        self.sum_rads += gyro_rads;
        self.num_samples += 1;
    }

    pub fn is_complete(&self) -> bool {
        self.num_samples >= self.target_samples
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn target_samples(&self) -> usize {
        self.target_samples
    }

    /// Mean of the gathered samples, `None` if there are none.
    pub fn mean(&self) -> Option<Vector3<f64>> {
        if self.num_samples == 0 {
            None
        }
        else {
            Some(self.sum_rads / self.num_samples as f64)
        }
    }
}

impl MagCalibration {
    pub fn new() -> Self {
        Self {
            min_ut: Vector3::repeat(std::f64::INFINITY),
            max_ut: Vector3::repeat(std::f64::NEG_INFINITY),
            num_samples: 0,
        }
    }

    pub fn add(&mut self, mag_ut: Vector3<f64>) {
        self.min_ut = self.min_ut.inf(&mag_ut);
        self.max_ut = self.max_ut.sup(&mag_ut);
        self.num_samples += 1;
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Compute the hard and soft iron corrections.
    ///
    /// A level rotation only exercises X and Y, so those axes must show at least
    /// `min_half_range_ut`. Z gets a scale only if its own range is comparable, otherwise it
    /// is left unscaled.
    pub fn solve(&self, min_half_range_ut: f64) -> Result<MagCorrection, HeadingEstError> {
        if self.num_samples == 0 {
            return Err(HeadingEstError::MagCalibrationDegenerate(0.0, 0.0));
        }

        let hard_iron_ut = (self.max_ut + self.min_ut) / 2.0;
        let half_range_ut = (self.max_ut - self.min_ut) / 2.0;

        if half_range_ut.x < min_half_range_ut || half_range_ut.y < min_half_range_ut {
            return Err(HeadingEstError::MagCalibrationDegenerate(
                half_range_ut.x,
                half_range_ut.y,
            ));
        }

        let avg_half_range_ut = (half_range_ut.x + half_range_ut.y) / 2.0;
        let z_scale = if half_range_ut.z >= 0.5 * avg_half_range_ut {
            avg_half_range_ut / half_range_ut.z
        }
        else {
            1.0
        };

        Ok(MagCorrection {
            hard_iron_ut,
            soft_iron_scale: Vector3::new(
                avg_half_range_ut / half_range_ut.x,
                avg_half_range_ut / half_range_ut.y,
                z_scale,
            ),
        })
    }
}

impl Default for MagCalibration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gyro_calibration_mean() {
        let mut c = GyroCalibration::new(4);
        assert_eq!(c.mean(), None);

        for z in [0.01, 0.03, 0.01, 0.03].iter() {
            assert!(!c.is_complete());
            c.add(Vector3::new(0.0, -0.02, *z));
        }

        assert!(c.is_complete());
        let mean = c.mean().unwrap();
        assert!((mean.z - 0.02).abs() < 1e-12);
        assert!((mean.y + 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_mag_calibration_solve() {
        // Ellipse centred on (10, -5) with 30 uT on X and 20 uT on Y
        let mut c = MagCalibration::new();
        for i in 0..360 {
            let a = (i as f64).to_radians();
            c.add(Vector3::new(10.0 + 30.0 * a.cos(), -5.0 + 20.0 * a.sin(), 40.0));
        }

        let corr = c.solve(1.0).unwrap();
        assert!((corr.hard_iron_ut.x - 10.0).abs() < 1e-9);
        assert!((corr.hard_iron_ut.y + 5.0).abs() < 1e-9);
        assert!((corr.soft_iron_scale.x - 25.0 / 30.0).abs() < 1e-9);
        assert!((corr.soft_iron_scale.y - 25.0 / 20.0).abs() < 1e-9);
        assert_eq!(corr.soft_iron_scale.z, 1.0);
    }

    #[test]
    fn test_mag_calibration_degenerate() {
        let mut c = MagCalibration::new();
        for _ in 0..10 {
            c.add(Vector3::new(20.0, 0.0, 40.0));
        }

        assert!(matches!(
            c.solve(1.0),
            Err(HeadingEstError::MagCalibrationDegenerate(_, _))
        ));
    }
}

//! Implementations for the ObstacleAvoidance state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{AvoidDir, ObstacleParams};
use comms_if::eqpt::range::RangeReadings;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Obstacle avoidance state.
#[derive(Debug, Clone)]
pub struct ObstacleAvoidance {
    params: ObstacleParams,

    assessment: Assessment,
}

/// Assessment of the most recent range readings.
///
/// Invalid readings (no echo) are held at the maximum range so they never look like a
/// close object.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Assessment {
    /// Units: centimetres
    pub left_cm: f64,

    /// Units: centimetres
    pub middle_cm: f64,

    /// Units: centimetres
    pub right_cm: f64,

    /// Smallest of the three distances.
    ///
    /// Units: centimetres
    pub closest_cm: f64,

    pub obstacle: bool,

    pub critical: bool,

    /// Only set while there is an obstacle
    pub direction: Option<AvoidDir>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ObstacleAvoidance {

    pub fn new(params: ObstacleParams) -> Self {
        Self {
            assessment: Assessment::clear(params.max_range_cm),
            params,
        }
    }

    /// Create a new engine loading parameters from the given parameter file.
    pub fn init(params_path: &str) -> Result<Self, util::params::LoadError> {
        Ok(Self::new(util::params::load(params_path)?))
    }

    /// Assess a new set of readings.
    pub fn update(&mut self, readings: &RangeReadings) -> &Assessment {
        let left_cm = self.sanitise(readings.left_cm);
        let middle_cm = self.sanitise(readings.middle_cm);
        let right_cm = self.sanitise(readings.right_cm);

        let closest_cm = left_cm.min(middle_cm).min(right_cm);

        // Strictly below the threshold, a reading at the threshold is clear
        let thresh = self.params.obstacle_threshold_cm;
        let blocked_l = left_cm < thresh;
        let blocked_m = middle_cm < thresh;
        let blocked_r = right_cm < thresh;

        let obstacle = blocked_l || blocked_m || blocked_r;

        let direction = if !obstacle {
            None
        }
        else if blocked_l && blocked_m && blocked_r {
            Some(AvoidDir::Back)
        }
        else if blocked_m {
            // Ties go right
            if left_cm > right_cm { Some(AvoidDir::Left) } else { Some(AvoidDir::Right) }
        }
        else if blocked_l {
            if blocked_r { Some(AvoidDir::Back) } else { Some(AvoidDir::Right) }
        }
        else {
            Some(AvoidDir::Left)
        };

        // Critical only when boxed in, a close object with an open side is steered around
        let critical = closest_cm < self.params.critical_threshold_cm
            && direction == Some(AvoidDir::Back);

        self.assessment = Assessment {
            left_cm,
            middle_cm,
            right_cm,
            closest_cm,
            obstacle,
            critical,
            direction,
        };

        trace!(
            "Obstacle assessment: L {:.0} M {:.0} R {:.0} cm, obstacle {}, critical {}, dir {:?}",
            left_cm, middle_cm, right_cm, obstacle, self.assessment.critical, direction
        );

        &self.assessment
    }

    /// Forget the last assessment.
    pub fn clear(&mut self) {
        self.assessment = Assessment::clear(self.params.max_range_cm);
    }

    pub fn has_obstacle(&self) -> bool {
        self.assessment.obstacle
    }

    pub fn is_critical(&self) -> bool {
        self.assessment.critical
    }

    pub fn direction(&self) -> Option<AvoidDir> {
        self.assessment.direction
    }

    pub fn closest_cm(&self) -> f64 {
        self.assessment.closest_cm
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    /// Speed to use given the last assessment.
    ///
    /// Zero when critical, otherwise `nominal` scaled by the closest distance as a fraction
    /// of the obstacle threshold, limited to `[min_speed_ratio, 1]`.
    pub fn recommended_speed(&self, nominal: i32) -> i32 {
        if self.assessment.critical {
            return 0;
        }

        if !self.assessment.obstacle {
            return nominal;
        }

        let ratio = (self.assessment.closest_cm / self.params.obstacle_threshold_cm)
            .max(self.params.min_speed_ratio)
            .min(1.0);

        (nominal as f64 * ratio).round() as i32
    }

    pub fn params(&self) -> &ObstacleParams {
        &self.params
    }

    /// Map a reading to its effective distance, no echo counts as maximum range.
    fn sanitise(&self, reading_cm: f64) -> f64 {
        if reading_cm.is_finite() && reading_cm > 0.0 && reading_cm <= self.params.max_range_cm {
            reading_cm
        }
        else {
            self.params.max_range_cm
        }
    }
}

impl Default for ObstacleAvoidance {
    fn default() -> Self {
        Self::new(ObstacleParams::default())
    }
}

impl Assessment {
    fn clear(max_range_cm: f64) -> Self {
        Self {
            left_cm: max_range_cm,
            middle_cm: max_range_cm,
            right_cm: max_range_cm,
            closest_cm: max_range_cm,
            obstacle: false,
            critical: false,
            direction: None,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn assess(l: f64, m: f64, r: f64) -> ObstacleAvoidance {
        let mut oa = ObstacleAvoidance::default();
        oa.update(&RangeReadings::new(l, m, r));
        oa
    }

    #[test]
    fn test_middle_obstacle() {
        let oa = assess(100.0, 5.0, 100.0);
        assert!(oa.has_obstacle());
        assert!(!oa.is_critical());
        assert_eq!(oa.direction(), Some(AvoidDir::Right));

        assert_eq!(assess(120.0, 20.0, 100.0).direction(), Some(AvoidDir::Left));
        assert_eq!(assess(80.0, 20.0, 100.0).direction(), Some(AvoidDir::Right));
    }

    #[test]
    fn test_clear() {
        let oa = assess(100.0, 100.0, 100.0);
        assert!(!oa.has_obstacle());
        assert!(!oa.is_critical());
        assert_eq!(oa.direction(), None);
        assert_eq!(oa.recommended_speed(200), 200);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        // A reading equal to the threshold is clear
        let oa = assess(30.0, 30.0, 30.0);
        assert!(!oa.has_obstacle());
        assert_eq!(oa.direction(), None);
        assert_eq!(oa.recommended_speed(200), 200);

        let oa = assess(100.0, 29.9, 100.0);
        assert!(oa.has_obstacle());
        assert_eq!(oa.direction(), Some(AvoidDir::Right));

        // Boxed in at exactly the critical distance
        let oa = assess(15.0, 15.0, 15.0);
        assert_eq!(oa.direction(), Some(AvoidDir::Back));
        assert!(!oa.is_critical());
        assert_eq!(oa.recommended_speed(200), 100);

        assert!(assess(14.9, 15.0, 15.0).is_critical());
    }

    #[test]
    fn test_all_blocked() {
        let oa = assess(5.0, 5.0, 5.0);
        assert_eq!(oa.direction(), Some(AvoidDir::Back));
        assert!(oa.is_critical());
        assert_eq!(oa.recommended_speed(200), 0);
    }

    #[test]
    fn test_side_obstacles() {
        assert_eq!(assess(20.0, 100.0, 100.0).direction(), Some(AvoidDir::Right));
        assert_eq!(assess(20.0, 100.0, 25.0).direction(), Some(AvoidDir::Back));
        assert_eq!(assess(100.0, 100.0, 20.0).direction(), Some(AvoidDir::Left));
    }

    #[test]
    fn test_critical_only_when_boxed_in() {
        // Close, but there is room on the left
        let oa = assess(100.0, 100.0, 10.0);
        assert!(!oa.is_critical());

        let oa = assess(10.0, 100.0, 12.0);
        assert_eq!(oa.direction(), Some(AvoidDir::Back));
        assert!(oa.is_critical());
        assert_eq!(oa.recommended_speed(200), 0);

        // Boxed in but not yet close
        let oa = assess(20.0, 25.0, 20.0);
        assert_eq!(oa.direction(), Some(AvoidDir::Back));
        assert!(!oa.is_critical());
    }

    #[test]
    fn test_invalid_readings_ignored() {
        let oa = assess(0.0, -3.0, 500.0);
        assert!(!oa.has_obstacle());
        assert_eq!(oa.closest_cm(), 200.0);

        let oa = assess(std::f64::NAN, 10.0, 0.0);
        assert!(oa.has_obstacle());
        assert!(!oa.is_critical());
        assert_eq!(oa.direction(), Some(AvoidDir::Right));
    }

    #[test]
    fn test_recommended_speed() {
        // 24 / 30 = 0.8
        assert_eq!(assess(24.0, 100.0, 100.0).recommended_speed(200), 160);

        // Rounded to the nearest unit, then limited by the minimum ratio
        assert_eq!(assess(100.0, 16.0, 100.0).recommended_speed(200), 107);
        assert_eq!(assess(100.0, 5.0, 100.0).recommended_speed(200), 60);
    }
}

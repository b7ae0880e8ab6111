//! Obstacle avoidance parameters

// External
use serde::{Deserialize, Serialize};

/// Parameters for obstacle avoidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleParams {
    /// A valid reading closer than this is an obstacle.
    ///
    /// Units: centimetres
    pub obstacle_threshold_cm: f64,

    /// The closest valid reading being under this while no side is clear is critical, the
    /// mower must stop.
    ///
    /// Units: centimetres
    pub critical_threshold_cm: f64,

    /// Maximum range of the sensors, readings above this are no echo.
    ///
    /// Units: centimetres
    pub max_range_cm: f64,

    /// Lowest fraction of the nominal speed recommended near a non-critical obstacle
    pub min_speed_ratio: f64,
}

impl Default for ObstacleParams {
    fn default() -> Self {
        Self {
            obstacle_threshold_cm: 30.0,
            critical_threshold_cm: 15.0,
            max_range_cm: 200.0,
            min_speed_ratio: 0.3,
        }
    }
}

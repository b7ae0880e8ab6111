//! # [`MissionState::Avoiding`] implementation
//!
//! [`MissionState::Avoiding`]: super::MissionState::Avoiding

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

use super::{AvoidParams, Leg, Maneuver, MissionCtx, MissionParams, MissionState, Mowing, Transition};
use crate::{motion_ctrl::TurnDir, obstacle::AvoidDir};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Manoeuvring around an obstacle.
///
/// Possible transitions:
/// - Mowing, on the first tick with no obstacle after the first manoeuvre has run
///
/// If the obstacle is still there once a manoeuvre ends the mower waits, stopped, and
/// checks again every tick. Another manoeuvre starts when the obstacle moves to a different
/// side or after `retry_dwell_s`.
#[derive(Debug, Clone)]
pub struct Avoiding {
    dir: AvoidDir,

    /// `None` until the first step builds it
    maneuver: Option<Maneuver>,

    /// Number of manoeuvres run so far
    attempts: u32,

    /// Set while stopped between manoeuvres with the obstacle still in view.
    ///
    /// Units: seconds
    holding_since_s: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Avoiding {
    pub fn new(dir: AvoidDir) -> Self {
        Self {
            dir,
            maneuver: None,
            attempts: 0,
            holding_since_s: None,
        }
    }

    pub fn direction(&self) -> AvoidDir {
        self.dir
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn step(&mut self, params: &MissionParams, ctx: &mut MissionCtx) -> Transition {
        if ctx.eqpt.blade_running() {
            ctx.eqpt.stop_blade();
        }

        // The first manoeuvre always runs to completion, retries are dropped once clear
        let retrying = self.holding_since_s.is_some() || self.attempts > 1;
        if retrying && !ctx.obstacle.has_obstacle() {
            return path_clear();
        }

        if let Some(since_s) = self.holding_since_s {
            let dir = ctx.obstacle.direction().unwrap_or(self.dir);

            if dir == self.dir && ctx.now_s - since_s < params.avoid.retry_dwell_s {
                return Transition::Stay;
            }

            self.dir = dir;
            self.holding_since_s = None;
        }

        if self.maneuver.is_none() {
            self.attempts += 1;
            info!("Avoiding - {} (attempt {})", self.dir, self.attempts);
            self.maneuver = Some(avoid_maneuver(
                self.dir,
                &params.avoid,
                ctx.motion.params().turn_speed,
            ));
        }

        let finished = match self.maneuver {
            Some(ref mut m) => m.step(ctx.motion, ctx.eqpt),
            None => true,
        };

        if !finished {
            return Transition::Stay;
        }

        self.maneuver = None;
        if !ctx.obstacle.has_obstacle() {
            return path_clear();
        }

        ctx.motion.stop(ctx.eqpt);
        if let Some(dir) = ctx.obstacle.direction() {
            self.dir = dir;
        }
        self.holding_since_s = Some(ctx.now_s);
        Transition::Stay
    }

    /// True while stopped between manoeuvres.
    pub fn is_holding(&self) -> bool {
        self.holding_since_s.is_some()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn path_clear() -> Transition {
    info!("Path clear - resuming mowing");
    Transition::To(MissionState::Mowing(Mowing::new()))
}

/// Reverse, pause, then pivot, keyed by the avoidance direction.
fn avoid_maneuver(dir: AvoidDir, params: &AvoidParams, turn_speed: i32) -> Maneuver {
    let (backup_cm, pivot_dir, pivot_s) = match dir {
        AvoidDir::Left => (params.side_backup_cm, TurnDir::Left, params.side_pivot_s),
        AvoidDir::Right => (params.side_backup_cm, TurnDir::Right, params.side_pivot_s),
        AvoidDir::Back => (params.back_backup_cm, TurnDir::Right, params.back_pivot_s),
    };

    Maneuver::new()
        .then(Leg::Reverse {
            distance_cm: backup_cm,
        })
        .then(Leg::Hold {
            duration_s: params.hold_s,
        })
        .then(Leg::Pivot {
            dir: pivot_dir,
            speed: turn_speed,
            duration_s: pivot_s,
        })
}

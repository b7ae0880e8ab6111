//! # [`MissionState::SearchingSignal`] implementation
//!
//! [`MissionState::SearchingSignal`]: super::MissionState::SearchingSignal

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};

use super::{
    Leg, Maneuver, MissionCtx, MissionParams, MissionState, Mowing, Returning, StateKind,
    Transition,
};
use crate::motion_ctrl::TurnDir;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Searching for a lost perimeter signal with an outward clockwise spiral: forward legs
/// that grow a little on each step, each followed by a short pivot to the right.
///
/// The search timeout is applied by the mission manager.
///
/// Possible transitions:
/// - The state that requested the search (Returning or Mowing), or Idle, once the signal is
///   found
#[derive(Debug, Clone)]
pub struct SearchingSignal {
    /// State to go back to once the signal is found
    resume: StateKind,

    /// Spiral step, the forward leg lengthens with each one
    step: u32,

    spiral: Option<Maneuver>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SearchingSignal {
    pub fn new(resume: StateKind) -> Self {
        Self {
            resume,
            step: 0,
            spiral: None,
        }
    }

    pub fn resume_kind(&self) -> StateKind {
        self.resume
    }

    pub fn spiral_step(&self) -> u32 {
        self.step
    }

    pub fn step(&mut self, params: &MissionParams, ctx: &mut MissionCtx) -> Transition {
        if ctx.eqpt.blade_running() {
            ctx.eqpt.stop_blade();
        }

        if ctx.boundary.has_signal() {
            info!("Perimeter signal found");
            ctx.motion.stop(ctx.eqpt);

            return match self.resume {
                StateKind::Returning => Transition::To(MissionState::Returning(Returning::new())),
                StateKind::Mowing => Transition::To(MissionState::Mowing(Mowing::new())),
                _ => Transition::To(MissionState::Idle),
            };
        }

        let finished = match self.spiral {
            Some(ref mut m) => m.step(ctx.motion, ctx.eqpt),
            None => true,
        };

        if finished {
            self.step += 1;
            if self.step % 10 == 0 {
                info!("Signal search step {} - still searching", self.step);
            }

            let search = &params.search;
            let leg_s = (search.leg_base_s + search.leg_step_s * self.step as f64)
                .min(search.leg_max_s);
            debug!("Spiral step {}: forward {:.2} s", self.step, leg_s);

            let mut spiral = Maneuver::new()
                .then(Leg::Forward {
                    speed: ctx.motion.params().slow_speed,
                    duration_s: leg_s,
                })
                .then(Leg::Pivot {
                    dir: TurnDir::Right,
                    speed: ctx.motion.params().turn_speed,
                    duration_s: search.turn_s,
                });
            spiral.step(ctx.motion, ctx.eqpt);
            self.spiral = Some(spiral);
        }

        Transition::Stay
    }
}

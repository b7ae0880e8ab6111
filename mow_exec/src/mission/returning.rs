//! # [`MissionState::Returning`] implementation
//!
//! [`MissionState::Returning`]: super::MissionState::Returning

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::perimeter::BoundaryZone;
use log::{debug, warn};

use super::{
    Leg, Maneuver, MissionCtx, MissionParams, MissionState, SearchingSignal, StateKind,
    Transition,
};
use crate::motion_ctrl::TurnDir;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Following the perimeter wire home, keeping it on the left.
///
/// There is no dock detection, the state runs until stopped or until the global state
/// timeout.
///
/// Possible transitions:
/// - SearchingSignal, when the wire signal is lost
#[derive(Debug, Clone, Default)]
pub struct Returning {
    /// Corrective pivot in progress
    correction: Option<Maneuver>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Returning {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, params: &MissionParams, ctx: &mut MissionCtx) -> Transition {
        if ctx.eqpt.blade_running() {
            ctx.eqpt.stop_blade();
        }

        if let Some(ref mut correction) = self.correction {
            if !correction.step(ctx.motion, ctx.eqpt) {
                return Transition::Stay;
            }
            self.correction = None;
        }

        if !ctx.boundary.has_signal() {
            warn!("Lost perimeter signal during return");
            ctx.motion.stop(ctx.eqpt);
            return Transition::To(MissionState::SearchingSignal(SearchingSignal::new(
                StateKind::Returning,
            )));
        }

        let wire = &params.wire_follow;
        let slow = ctx.motion.params().slow_speed;

        match ctx.boundary.zone {
            BoundaryZone::Outside => {
                debug!("Outside the wire - pivoting back in");
                self.start_correction(ctx, TurnDir::Left, slow, wire.outside_pivot_s);
            }
            BoundaryZone::OnWire => {
                debug!("On the wire - nudging away");
                self.start_correction(ctx, TurnDir::Right, slow, wire.on_wire_pivot_s);
            }
            BoundaryZone::Inside => {
                let strength = ctx.boundary.strength;
                let (left, right) = if strength > wire.target_strength + wire.strength_band {
                    // Too close, steer away
                    (slow, slow - wire.steer_delta)
                }
                else if strength < wire.target_strength - wire.strength_band {
                    (slow - wire.steer_delta, slow)
                }
                else {
                    (slow, slow)
                };
                ctx.motion.drive_direct(ctx.eqpt, left, right);
            }
            BoundaryZone::NoSignal | BoundaryZone::Fault => ctx.motion.stop(ctx.eqpt),
        }

        Transition::Stay
    }

    fn start_correction(&mut self, ctx: &mut MissionCtx, dir: TurnDir, speed: i32, duration_s: f64) {
        let mut correction = Maneuver::new().then(Leg::Pivot {
            dir,
            speed,
            duration_s,
        });

        if !correction.step(ctx.motion, ctx.eqpt) {
            self.correction = Some(correction);
        }
    }
}

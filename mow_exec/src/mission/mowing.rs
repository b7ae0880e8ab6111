//! # [`MissionState::Mowing`] implementation
//!
//! [`MissionState::Mowing`]: super::MissionState::Mowing

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::perimeter::WireSide;
use log::info;

use super::{
    Avoiding, Leg, Maneuver, MissionCtx, MissionParams, MissionState, Transition, Turning,
};
use crate::{motion_ctrl::TurnDir, obstacle::AvoidDir};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Mowing the current row.
///
/// Possible transitions:
/// - Turning, at the end of a row or when the boundary cuts a row short
/// - Avoiding, when an obstacle is detected
/// - Idle, if the pattern is already complete
#[derive(Debug, Clone, Default)]
pub struct Mowing {
    /// Recovery from a boundary breach while no pattern is running
    recovery: Option<Maneuver>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Mowing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recovering(&self) -> bool {
        self.recovery.is_some()
    }

    pub fn step(&mut self, params: &MissionParams, ctx: &mut MissionCtx) -> Transition {
        if let Some(ref mut recovery) = self.recovery {
            if !recovery.step(ctx.motion, ctx.eqpt) {
                return Transition::Stay;
            }
            self.recovery = None;
        }

        if ctx.planner.is_pattern_complete() {
            info!("Mowing pattern complete");
            return Transition::To(MissionState::Idle);
        }

        // ---- BOUNDARY ----

        if ctx.boundary.has_signal() && ctx.boundary.is_breached() {
            info!("Perimeter boundary detected ({:?})", ctx.boundary.zone);
            ctx.eqpt.stop_blade();

            if ctx.planner.is_active() {
                ctx.planner.perimeter_reached();
                ctx.planner.start_turn();
                info!("Pattern-aware turn: {:?}", ctx.planner.turn_direction());

                let back_off = Maneuver::new()
                    .then(Leg::Reverse {
                        distance_cm: params.boundary_recovery.backup_cm,
                    })
                    .then(Leg::Hold {
                        duration_s: params.boundary_recovery.hold_s,
                    });

                return Transition::To(MissionState::Turning(Turning::after_boundary(
                    ctx.planner,
                    back_off,
                )));
            }

            // Not in a pattern, turn away from the wire
            let dir = match ctx.boundary.side {
                WireSide::Right => TurnDir::Left,
                _ => TurnDir::Right,
            };
            info!("Perimeter on {:?} side - turning {:?}", ctx.boundary.side, dir);

            let mut recovery = Maneuver::new()
                .then(Leg::Reverse {
                    distance_cm: params.boundary_recovery.backup_cm,
                })
                .then(Leg::Hold {
                    duration_s: params.boundary_recovery.hold_s,
                })
                .then(Leg::Pivot {
                    dir,
                    speed: ctx.motion.params().turn_speed,
                    duration_s: params.boundary_recovery.pivot_s,
                });
            recovery.step(ctx.motion, ctx.eqpt);
            self.recovery = Some(recovery);

            return Transition::Stay;
        }

        // ---- OBSTACLES ----

        if ctx.obstacle.has_obstacle() {
            let dir = ctx.obstacle.direction().unwrap_or(AvoidDir::Back);
            return Transition::To(MissionState::Avoiding(Avoiding::new(dir)));
        }

        // ---- ROW END ----

        if ctx.planner.should_turn(ctx.now_s) {
            ctx.planner.start_turn();
            return Transition::To(MissionState::Turning(Turning::new(ctx.planner)));
        }

        // ---- DRIVE ----

        ctx.motion.set_target_heading(ctx.planner.target_heading_deg());
        let speed = ctx.motion.params().cruise_speed;
        let heading_deg = ctx.est.heading_deg();
        ctx.motion.drive_straight(ctx.eqpt, speed, heading_deg);

        if !ctx.eqpt.blade_running() && !ctx.eqpt.blade_safety_locked() {
            info!("Starting blade");
            ctx.eqpt.start_blade();
        }

        Transition::Stay
    }
}

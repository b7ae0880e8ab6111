//! # [`MissionState::Turning`] implementation
//!
//! [`MissionState::Turning`]: super::MissionState::Turning

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};

use super::{Leg, Maneuver, MissionCtx, MissionParams, MissionState, Mowing, Transition};
use crate::{
    coverage::CoveragePlanner,
    motion_ctrl::TurnDir,
};
use util::maths::norm_angle_deg;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Moving from the end of one row onto the start of the next.
///
/// The turn is a quarter turn in the planner's turn direction, a shift of one row width,
/// then a quarter turn onto the next row's heading.
///
/// Possible transitions:
/// - Mowing, on the next row
/// - Idle, if that was the last row
#[derive(Debug, Clone)]
pub struct Turning {
    phase: TurnPhase,

    /// Direction of both quarter turns
    dir: TurnDir,

    /// Heading after the first quarter turn.
    ///
    /// Units: degrees
    cross_heading_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum TurnPhase {
    /// Backing away from the boundary
    BackOff(Maneuver),

    /// Turning square to the rows
    FirstQuarter,

    /// Moving across to the next row
    Shift(Option<Maneuver>),

    /// Turning onto the next row
    FinalQuarter,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Turning {
    pub fn new(planner: &CoveragePlanner) -> Self {
        let dir = planner.turn_direction();
        let offset_deg = match dir {
            TurnDir::Right => 90.0,
            TurnDir::Left => -90.0,
        };

        Self {
            phase: TurnPhase::FirstQuarter,
            dir,
            cross_heading_deg: norm_angle_deg(planner.target_heading_deg() + offset_deg),
        }
    }

    /// A turn triggered by the boundary, which first runs the back off manoeuvre.
    pub fn after_boundary(planner: &CoveragePlanner, back_off: Maneuver) -> Self {
        Self {
            phase: TurnPhase::BackOff(back_off),
            ..Self::new(planner)
        }
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    pub fn step(&mut self, _params: &MissionParams, ctx: &mut MissionCtx) -> Transition {
        if ctx.eqpt.blade_running() {
            ctx.eqpt.stop_blade();
        }

        let heading_deg = ctx.est.heading_deg();

        match self.phase {
            TurnPhase::BackOff(ref mut back_off) => {
                if back_off.step(ctx.motion, ctx.eqpt) {
                    debug!("Boundary back off complete");
                    self.phase = TurnPhase::FirstQuarter;
                }
            }
            TurnPhase::FirstQuarter => {
                if ctx.motion.turn_to_heading(ctx.eqpt, self.cross_heading_deg, heading_deg) {
                    debug!("First quarter turn {:?} complete", self.dir);
                    self.phase = TurnPhase::Shift(None);
                }
            }
            TurnPhase::Shift(ref mut shift) => {
                let shift = shift.get_or_insert_with(|| {
                    let speed_cms = ctx.planner.params().assumed_speed_cms;
                    let duration_s = if speed_cms > 0.0 {
                        ctx.planner.row_width_cm() / speed_cms
                    }
                    else {
                        0.0
                    };

                    Maneuver::new().then(Leg::Forward {
                        speed: ctx.motion.params().cruise_speed,
                        duration_s,
                    })
                });

                if shift.step(ctx.motion, ctx.eqpt) {
                    self.phase = TurnPhase::FinalQuarter;
                }
            }
            TurnPhase::FinalQuarter => {
                let target_deg = ctx.planner.next_row_heading_deg();

                if ctx.motion.turn_to_heading(ctx.eqpt, target_deg, heading_deg) {
                    ctx.planner.complete_turn();
                    ctx.planner.clear_perimeter_trigger();
                    ctx.planner.next_row(ctx.now_s);

                    if ctx.planner.is_pattern_complete() {
                        info!("Mowing pattern complete");
                        return Transition::To(MissionState::Idle);
                    }

                    return Transition::To(MissionState::Mowing(Mowing::new()));
                }
            }
        }

        Transition::Stay
    }
}

//! # [`MissionState::Calibrating`] implementation
//!
//! [`MissionState::Calibrating`]: super::MissionState::Calibrating

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::tc::mission::CalibKind;
use log::{error, info};

use super::{MissionCtx, MissionParams, MissionState, Transition};
use crate::motion_ctrl::TurnDir;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Calibrating one of the inertial sensors.
///
/// The gyroscope is calibrated with the mower held still, the magnetometer while it pivots
/// in place for a fixed time. Both calibrations feed on the regular estimator updates.
///
/// Possible transitions:
/// - Idle, once the calibration completes or fails
#[derive(Debug, Clone)]
pub struct Calibrating {
    kind: CalibKind,

    /// Time at which the calibration began, `None` until the first tick.
    ///
    /// Units: seconds
    started_s: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Calibrating {
    pub fn new(kind: CalibKind) -> Self {
        Self {
            kind,
            started_s: None,
        }
    }

    pub fn calib_kind(&self) -> CalibKind {
        self.kind
    }

    pub fn step(&mut self, params: &MissionParams, ctx: &mut MissionCtx) -> Transition {
        if ctx.eqpt.blade_running() {
            ctx.eqpt.stop_blade();
        }

        match self.kind {
            CalibKind::Gyro => self.step_gyro(ctx),
            CalibKind::Magnetometer => self.step_mag(params, ctx),
        }
    }

    fn step_gyro(&mut self, ctx: &mut MissionCtx) -> Transition {
        if self.started_s.is_none() {
            ctx.motion.stop(ctx.eqpt);
            let samples = ctx.est.params().gyro_calib_samples;
            ctx.est.begin_gyro_calibration(samples);
            self.started_s = Some(ctx.now_s);
            return Transition::Stay;
        }

        if ctx.est.is_calibrating_gyro() {
            Transition::Stay
        }
        else {
            info!("Gyro calibration complete");
            Transition::To(MissionState::Idle)
        }
    }

    fn step_mag(&mut self, params: &MissionParams, ctx: &mut MissionCtx) -> Transition {
        let started_s = match self.started_s {
            Some(t) => t,
            None => {
                if let Err(e) = ctx.est.begin_mag_calibration() {
                    error!("Cannot calibrate magnetometer: {}", e);
                    ctx.motion.stop(ctx.eqpt);
                    return Transition::To(MissionState::Idle);
                }

                let speed = ctx.motion.params().slow_speed;
                ctx.motion.turn_in_place(ctx.eqpt, TurnDir::Right, speed);
                self.started_s = Some(ctx.now_s);
                return Transition::Stay;
            }
        };

        if ctx.now_s - started_s < params.mag_calib_duration_s {
            return Transition::Stay;
        }

        ctx.motion.stop(ctx.eqpt);
        match ctx.est.finish_mag_calibration() {
            Ok(_) => info!("Magnetometer calibration complete"),
            Err(e) => error!("Magnetometer calibration failed: {}", e),
        }

        Transition::To(MissionState::Idle)
    }
}

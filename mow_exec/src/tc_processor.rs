//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source, turning them into calls on
//! the mission manager or, for manual commands, directly on the equipment.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};

// Internal
use comms_if::tc::{manual::ManualCmd, mission::MissionCmd, Tc};
use mow_lib::{data_store::DataStore, eqpt::MowerEqpt};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Returns `false` if the command was refused, which is logged by whoever refused it.
pub(crate) fn exec(ds: &mut DataStore, eqpt: &mut dyn MowerEqpt, tc: &Tc, now_s: f64) -> bool {
    debug!("Executing TC: {:?}", tc);

    match tc {
        Tc::Mission(cmd) => exec_mission(ds, *cmd, now_s),
        Tc::Manual(cmd) => exec_manual(ds, eqpt, *cmd, now_s),
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn exec_mission(ds: &mut DataStore, cmd: MissionCmd, now_s: f64) -> bool {
    match cmd {
        MissionCmd::Start => ds.mission.start_mowing(&mut ds.planner, now_s),
        MissionCmd::Pause => ds.mission.pause_mowing(&mut ds.planner, now_s),
        MissionCmd::Stop => ds.mission.stop_mowing(&mut ds.planner, now_s),
        MissionCmd::ReturnToBase => ds.mission.return_to_base(&mut ds.planner, now_s),
        MissionCmd::SearchSignal => ds.mission.search_for_signal(now_s),
        MissionCmd::Calibrate(kind) => ds.mission.start_calibration(kind, now_s),
        MissionCmd::ResetHeading => {
            ds.heading_est.reset_heading();
            info!("Heading reference reset");
            true
        }
        MissionCmd::Recover => ds.mission.recover(now_s),
    }
}

fn exec_manual(ds: &mut DataStore, eqpt: &mut dyn MowerEqpt, cmd: ManualCmd, now_s: f64) -> bool {
    if !ds.mission.enter_manual(now_s) {
        return false;
    }

    match cmd {
        ManualCmd::BladeOn => {
            if eqpt.blade_safety_locked() {
                warn!("Blade safety lock engaged, not starting the blade");
                return false;
            }
            eqpt.start_blade();
        }
        ManualCmd::BladeOff => eqpt.stop_blade(),
        ManualCmd::Stop => ds.motion_ctrl.stop(eqpt),
        _ => {
            if let Some((left, right)) = cmd.wheel_speeds() {
                ds.motion_ctrl.drive_direct(eqpt, left, right);
            }
        }
    }

    true
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::mission::CalibKind;
    use mow_lib::{
        eqpt::CuttingActuator,
        mission::StateKind,
        sim::{SimMower, SimParams},
    };

    #[test]
    fn test_mission_cmds() {
        let mut ds = DataStore::default();
        let mut sim = SimMower::new(SimParams::default());

        assert!(exec(&mut ds, &mut sim, &Tc::Mission(MissionCmd::Start), 0.0));
        assert_eq!(ds.mission.kind(), StateKind::Mowing);

        assert!(exec(&mut ds, &mut sim, &Tc::Mission(MissionCmd::Pause), 1.0));
        assert_eq!(ds.mission.kind(), StateKind::Idle);
        assert!(!exec(&mut ds, &mut sim, &Tc::Mission(MissionCmd::Pause), 1.0));

        assert!(exec(&mut ds, &mut sim, &Tc::Mission(MissionCmd::ReturnToBase), 2.0));
        assert_eq!(ds.mission.kind(), StateKind::Returning);

        assert!(exec(&mut ds, &mut sim, &Tc::Mission(MissionCmd::Stop), 3.0));
        assert_eq!(ds.mission.kind(), StateKind::Idle);

        assert!(exec(
            &mut ds,
            &mut sim,
            &Tc::Mission(MissionCmd::Calibrate(CalibKind::Gyro)),
            4.0
        ));
        assert_eq!(ds.mission.kind(), StateKind::Calibrating);

        // Nothing to recover from
        assert!(!exec(&mut ds, &mut sim, &Tc::Mission(MissionCmd::Recover), 5.0));
    }

    #[test]
    fn test_manual_cmds() {
        let mut ds = DataStore::default();
        let mut sim = SimMower::new(SimParams::default());

        let tank = Tc::Manual(ManualCmd::Tank { left: 120, right: -80 });
        assert!(exec(&mut ds, &mut sim, &tank, 0.0));
        assert_eq!(ds.mission.kind(), StateKind::Manual);
        assert_eq!(sim.wheel_dems(), (120, -80));

        assert!(exec(&mut ds, &mut sim, &Tc::Manual(ManualCmd::BladeOn), 0.1));
        assert!(sim.blade_running());
        assert!(exec(&mut ds, &mut sim, &Tc::Manual(ManualCmd::BladeOff), 0.2));
        assert!(!sim.blade_running());

        sim.set_blade_safety_lock(true);
        assert!(!exec(&mut ds, &mut sim, &Tc::Manual(ManualCmd::BladeOn), 0.3));
        assert!(!sim.blade_running());

        assert!(exec(&mut ds, &mut sim, &Tc::Manual(ManualCmd::Stop), 0.4));
        assert_eq!(sim.wheel_dems(), (0, 0));
    }

    #[test]
    fn test_manual_refused_in_error() {
        let mut ds = DataStore::default();
        let mut sim = SimMower::new(SimParams::default());

        ds.mission.report_fault("Test fault");
        ds.cycle(&mut sim, 0.0);

        let fwd = Tc::Manual(ManualCmd::Forward { speed: 150 });
        assert!(!exec(&mut ds, &mut sim, &fwd, 0.1));
        assert_eq!(sim.wheel_dems(), (0, 0));

        assert!(exec(&mut ds, &mut sim, &Tc::Mission(MissionCmd::Recover), 0.2));
        assert!(exec(&mut ds, &mut sim, &fwd, 0.3));
        assert_eq!(sim.wheel_dems(), (150, 150));
    }
}

//! # Mission module
//!
//! This module implements the [`MissionMgr`] state machine, which orchestrates the other
//! navigation components once per control tick. The states are:
//!
//! - `Idle` - Waiting for a command, the wheels and blade are held stopped.
//! - `Manual` - Wheels and blade are driven by external commands, nothing is overridden.
//! - `Calibrating` - Calibrating the gyroscope or the magnetometer.
//! - `Mowing` - Cutting along the current row of the coverage pattern.
//! - `Turning` - Moving onto the next row at the end of a row.
//! - `Avoiding` - Manoeuvring around an obstacle.
//! - `Returning` - Following the perimeter wire back to base.
//! - `SearchingSignal` - Spiralling outwards to find a lost perimeter signal.
//! - `Error` - Everything is stopped until an explicit recovery.
//!
//! Each tick the current state's handler runs first, then the timeouts and the fault
//! conditions are checked. A fault therefore always acts
//! at tick granularity and never in the middle of a handler.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod avoiding;
mod calibrating;
mod maneuver;
mod mowing;
mod params;
mod returning;
mod searching;
mod states;
mod turning;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{eqpt::perimeter::BoundaryStatus, tc::mission::CalibKind};
use log::{error, info, warn};

pub use self::{
    avoiding::Avoiding,
    calibrating::Calibrating,
    maneuver::{ticks_for, Leg, Maneuver},
    mowing::Mowing,
    params::*,
    returning::Returning,
    searching::SearchingSignal,
    states::{MissionState, StateKind, Transition},
    turning::{TurnPhase, Turning},
};

use crate::{
    battery::BatteryStatus, coverage::CoveragePlanner, eqpt::MowerEqpt,
    heading_est::HeadingEstimator, motion_ctrl::MotionCtrl, obstacle::ObstacleAvoidance,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Mission manager.
pub struct MissionMgr {
    params: MissionParams,

    state: MissionState,

    previous: StateKind,

    /// Mission time at which the current state was entered.
    ///
    /// Units: seconds
    entered_s: f64,

    /// Cause of the last error, cleared on recovery.
    last_error: Option<String>,

    /// Fault reported since the last tick.
    pending_fault: Option<String>,
}

/// Everything a state handler may use during one tick.
pub struct MissionCtx<'a> {
    pub est: &'a mut HeadingEstimator,
    pub motion: &'a mut MotionCtrl,
    pub planner: &'a mut CoveragePlanner,
    pub obstacle: &'a ObstacleAvoidance,
    pub eqpt: &'a mut dyn MowerEqpt,

    /// Latest perimeter wire status
    pub boundary: BoundaryStatus,

    /// Latest battery status
    pub battery: BatteryStatus,

    /// Mission clock.
    ///
    /// Units: seconds
    pub now_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MissionMgr {
    pub fn new(params: MissionParams, now_s: f64) -> Self {
        info!("Mission manager initialised - state: {}", StateKind::Idle);

        Self {
            params,
            state: MissionState::Idle,
            previous: StateKind::Idle,
            entered_s: now_s,
            last_error: None,
            pending_fault: None,
        }
    }

    /// Run one control tick.
    pub fn step(&mut self, ctx: &mut MissionCtx) {
        let transition = match &mut self.state {
            MissionState::Idle => {
                ctx.motion.stop(ctx.eqpt);
                if ctx.eqpt.blade_running() {
                    ctx.eqpt.stop_blade();
                }
                Transition::Stay
            }
            MissionState::Manual => Transition::Stay,
            MissionState::Calibrating(s) => s.step(&self.params, ctx),
            MissionState::Mowing(s) => s.step(&self.params, ctx),
            MissionState::Turning(s) => s.step(&self.params, ctx),
            MissionState::Avoiding(s) => s.step(&self.params, ctx),
            MissionState::Returning(s) => s.step(&self.params, ctx),
            MissionState::SearchingSignal(s) => s.step(&self.params, ctx),
            MissionState::Error { .. } => Transition::Stay,
        };

        if let Transition::To(new) = transition {
            self.set_state(new, ctx.now_s);
        }

        self.check_timeouts(ctx.now_s);
        self.check_faults(ctx);

        if self.kind() == StateKind::Error {
            ctx.eqpt.emergency_stop();
            ctx.eqpt.blade_emergency_stop();
            ctx.motion.clear();
        }
        else if self.kind().drives_forward()
            && ctx.obstacle.is_critical()
            && ctx.motion.is_driving_forward()
        {
            warn!("Critical obstacle - stopped");
            ctx.motion.stop(ctx.eqpt);
        }

        // Calibrations only run inside the calibrating state
        if self.kind() != StateKind::Calibrating {
            ctx.est.cancel_gyro_calibration();
            ctx.est.cancel_mag_calibration();
        }
    }

    // ---- OPERATIONS ----

    /// Start mowing, resuming an unfinished pattern or starting a new one.
    pub fn start_mowing(&mut self, planner: &mut CoveragePlanner, now_s: f64) -> bool {
        match self.kind() {
            StateKind::Error => {
                warn!("Cannot start mowing - mower in ERROR state");
                return false;
            }
            StateKind::Mowing | StateKind::Turning | StateKind::Avoiding => {
                info!("Already mowing");
                return true;
            }
            _ => (),
        }

        if planner.current_row() == 0 || !planner.resume_pattern(now_s) {
            planner.start_new_pattern(now_s);
        }

        self.set_state(MissionState::Mowing(Mowing::new()), now_s);
        true
    }

    /// Pause mowing, keeping the pattern progress.
    pub fn pause_mowing(&mut self, planner: &mut CoveragePlanner, now_s: f64) -> bool {
        match self.kind() {
            StateKind::Mowing | StateKind::Turning | StateKind::Avoiding => {
                planner.stop_pattern();
                self.set_state(MissionState::Idle, now_s);
                info!("Mowing paused");
                true
            }
            k => {
                warn!("Cannot pause from {}", k);
                false
            }
        }
    }

    /// Stop whatever is happening and abandon the pattern.
    pub fn stop_mowing(&mut self, planner: &mut CoveragePlanner, now_s: f64) -> bool {
        match self.kind() {
            StateKind::Idle | StateKind::Error => false,
            _ => {
                planner.reset();
                self.set_state(MissionState::Idle, now_s);
                info!("Mowing stopped");
                true
            }
        }
    }

    /// Follow the perimeter wire back to base.
    pub fn return_to_base(&mut self, planner: &mut CoveragePlanner, now_s: f64) -> bool {
        if self.refused_in_error("return to base") {
            return false;
        }

        planner.stop_pattern();
        self.set_state(MissionState::Returning(Returning::new()), now_s);
        info!("Starting return to base - following perimeter");
        true
    }

    /// Search for the perimeter signal, returning to the current state once found.
    pub fn search_for_signal(&mut self, now_s: f64) -> bool {
        if self.refused_in_error("search for signal") {
            return false;
        }

        let resume = self.kind();
        self.set_state(MissionState::SearchingSignal(SearchingSignal::new(resume)), now_s);
        true
    }

    pub fn start_calibration(&mut self, kind: CalibKind, now_s: f64) -> bool {
        if self.refused_in_error("calibrate") {
            return false;
        }

        self.set_state(MissionState::Calibrating(Calibrating::new(kind)), now_s);
        true
    }

    /// Hand the wheels and blade over to external commands.
    pub fn enter_manual(&mut self, now_s: f64) -> bool {
        if self.refused_in_error("enter manual control") {
            return false;
        }

        self.set_state(MissionState::Manual, now_s);
        true
    }

    /// Report a fault, the mower goes to error on the next fault check.
    pub fn report_fault<S: Into<String>>(&mut self, cause: S) {
        if self.pending_fault.is_none() {
            self.pending_fault = Some(cause.into());
        }
    }

    /// Leave the error state.
    pub fn recover(&mut self, now_s: f64) -> bool {
        if self.kind() != StateKind::Error {
            warn!("Nothing to recover from, state is {}", self.kind());
            return false;
        }

        self.last_error = None;
        self.pending_fault = None;
        self.set_state(MissionState::Idle, now_s);
        info!("Recovered from error state");
        true
    }

    // ---- QUERIES ----

    pub fn state(&self) -> &MissionState {
        &self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn previous_kind(&self) -> StateKind {
        self.previous
    }

    /// Units: seconds
    pub fn entered_s(&self) -> f64 {
        self.entered_s
    }

    /// Units: seconds
    pub fn time_in_state_s(&self, now_s: f64) -> f64 {
        (now_s - self.entered_s).max(0.0)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.kind().is_active()
    }

    pub fn params(&self) -> &MissionParams {
        &self.params
    }

    // ---- INTERNALS ----

    fn set_state(&mut self, new: MissionState, now_s: f64) {
        let old = self.kind();
        let new_kind = new.kind();

        if old == new_kind {
            return;
        }

        if let MissionState::Error { ref cause } = new {
            error!("Mower error: {}", cause);
            self.last_error = Some(cause.clone());
        }

        self.previous = old;
        self.state = new;
        self.entered_s = now_s;

        info!("State changed: {} -> {}", old, new_kind);
    }

    fn refused_in_error(&self, action: &str) -> bool {
        if self.kind() == StateKind::Error {
            warn!("Cannot {} - mower in ERROR state", action);
            true
        }
        else {
            false
        }
    }

    fn check_timeouts(&mut self, now_s: f64) {
        let kind = self.kind();
        let t = self.time_in_state_s(now_s);

        let cause = match kind {
            StateKind::Calibrating if t > self.params.calibration_timeout_s => {
                Some("Calibration timeout".to_string())
            }
            StateKind::SearchingSignal if t > self.params.search_timeout_s => {
                Some("Perimeter signal lost".to_string())
            }
            k if k.has_timeout() && t > self.params.state_timeout_s => {
                Some(format!("State timeout - stuck in {}", k))
            }
            _ => None,
        };

        if let Some(cause) = cause {
            self.set_state(MissionState::error(cause), now_s);
        }
    }

    fn check_faults(&mut self, ctx: &mut MissionCtx) {
        let kind = self.kind();
        if kind == StateKind::Error {
            return;
        }

        if let Some(cause) = self.pending_fault.take() {
            self.set_state(MissionState::error(cause), ctx.now_s);
        }
        else if ctx.battery.critical {
            self.set_state(MissionState::error("Critical battery"), ctx.now_s);
        }
        else if self.params.abort_on_tilt && ctx.est.is_tilted() {
            self.set_state(MissionState::error("Robot tilted"), ctx.now_s);
        }
        else if ctx.battery.low
            && kind.is_active()
            && !matches!(kind, StateKind::Returning | StateKind::SearchingSignal)
        {
            warn!("Low battery ({:.2} V) - returning to base", ctx.battery.voltage_v);
            ctx.planner.stop_pattern();
            self.set_state(MissionState::Returning(Returning::new()), ctx.now_s);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        battery::BatteryParams,
        eqpt::{
            BatteryMonitor, BoundarySensor, CuttingActuator, Drivetrain, EqptError,
            InertialSource, RangeSensors,
        },
    };
    use comms_if::eqpt::{
        imu::ImuSample,
        perimeter::{BoundaryZone, WireSide},
        range::RangeReadings,
    };

    #[derive(Default)]
    struct TestMower {
        left: i32,
        right: i32,
        blade: bool,
        locked: bool,
        num_estops: usize,
    }

    impl InertialSource for TestMower {
        fn read_inertial(&mut self) -> Result<ImuSample, EqptError> {
            Ok(ImuSample::default())
        }

        fn has_magnetometer(&self) -> bool {
            false
        }
    }

    impl RangeSensors for TestMower {
        fn read_ranges(&mut self) -> Result<RangeReadings, EqptError> {
            Ok(RangeReadings::new(200.0, 200.0, 200.0))
        }
    }

    impl Drivetrain for TestMower {
        fn set_speed(&mut self, left: i32, right: i32) {
            self.left = left;
            self.right = right;
        }

        fn emergency_stop(&mut self) {
            self.left = 0;
            self.right = 0;
            self.num_estops += 1;
        }
    }

    impl CuttingActuator for TestMower {
        fn start_blade(&mut self) {
            self.blade = true;
        }

        fn stop_blade(&mut self) {
            self.blade = false;
        }

        fn blade_running(&self) -> bool {
            self.blade
        }

        fn blade_safety_locked(&self) -> bool {
            self.locked
        }

        fn blade_emergency_stop(&mut self) {
            self.blade = false;
        }
    }

    impl BatteryMonitor for TestMower {
        fn read_voltage(&mut self) -> Result<f64, EqptError> {
            Ok(12.4)
        }
    }

    impl BoundarySensor for TestMower {
        fn read_boundary(&mut self) -> Result<BoundaryStatus, EqptError> {
            Ok(inside())
        }
    }

    /// Everything the mission manager orchestrates, stepped by hand.
    struct Rig {
        mgr: MissionMgr,
        est: HeadingEstimator,
        motion: MotionCtrl,
        planner: CoveragePlanner,
        obstacle: ObstacleAvoidance,
        eqpt: TestMower,
        boundary: BoundaryStatus,
        battery: BatteryStatus,
        now_s: f64,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                mgr: MissionMgr::new(MissionParams::default(), 0.0),
                est: HeadingEstimator::default(),
                motion: MotionCtrl::default(),
                planner: CoveragePlanner::default(),
                obstacle: ObstacleAvoidance::default(),
                eqpt: TestMower::default(),
                boundary: inside(),
                battery: BatteryStatus::from_voltage(12.4, &BatteryParams::default()),
                now_s: 0.0,
            }
        }

        fn tick(&mut self) {
            let mut ctx = MissionCtx {
                est: &mut self.est,
                motion: &mut self.motion,
                planner: &mut self.planner,
                obstacle: &self.obstacle,
                eqpt: &mut self.eqpt,
                boundary: self.boundary,
                battery: self.battery,
                now_s: self.now_s,
            };
            self.mgr.step(&mut ctx);
            self.now_s += 0.05;
        }

        fn start_mowing(&mut self) -> bool {
            self.mgr.start_mowing(&mut self.planner, self.now_s)
        }

        fn avoiding(&self) -> Option<&Avoiding> {
            match self.mgr.state() {
                MissionState::Avoiding(a) => Some(a),
                _ => None,
            }
        }

        /// Tick until the given state is reached, returning the number of ticks taken.
        fn tick_until(&mut self, kind: StateKind, max_ticks: usize) -> Option<usize> {
            for i in 0..max_ticks {
                self.tick();
                if self.mgr.kind() == kind {
                    return Some(i + 1);
                }
            }
            None
        }
    }

    fn inside() -> BoundaryStatus {
        BoundaryStatus {
            zone: BoundaryZone::Inside,
            strength: 30.0,
            side: WireSide::Unknown,
        }
    }

    #[test]
    fn test_mowing_drives_and_cuts() {
        let mut rig = Rig::new();

        assert!(rig.start_mowing());
        assert_eq!(rig.mgr.kind(), StateKind::Mowing);
        assert!(rig.planner.is_active());

        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Mowing);
        assert!(rig.eqpt.blade);
        assert!(rig.eqpt.left > 0 && rig.eqpt.right > 0);

        // The blade is never started with the safety lock engaged
        let mut rig = Rig::new();
        rig.eqpt.locked = true;
        rig.start_mowing();
        rig.tick();
        assert!(!rig.eqpt.blade);
    }

    #[test]
    fn test_obstacle_avoidance_cycle() {
        let mut rig = Rig::new();
        rig.start_mowing();
        rig.tick();

        rig.obstacle.update(&RangeReadings::new(100.0, 20.0, 100.0));
        rig.tick();
        match rig.mgr.state() {
            MissionState::Avoiding(a) => assert_eq!(a.direction(), crate::obstacle::AvoidDir::Right),
            s => panic!("expected AVOIDING, got {}", s),
        }

        // Reversing with the blade stopped
        rig.tick();
        assert!(!rig.eqpt.blade);
        assert!(rig.eqpt.left < 0 && rig.eqpt.right < 0);

        rig.obstacle.update(&RangeReadings::new(100.0, 100.0, 100.0));
        let ticks = rig.tick_until(StateKind::Mowing, 200);
        assert!(ticks.is_some(), "never returned to mowing");
        assert_eq!(rig.mgr.previous_kind(), StateKind::Avoiding);
    }

    #[test]
    fn test_avoiding_retries_while_blocked() {
        let mut rig = Rig::new();
        rig.start_mowing();
        rig.obstacle.update(&RangeReadings::new(25.0, 20.0, 100.0));
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Avoiding);

        for _ in 0..200 {
            rig.tick();
        }
        assert_eq!(rig.mgr.kind(), StateKind::Avoiding);
        match rig.mgr.state() {
            MissionState::Avoiding(a) => assert!(a.attempts() > 1),
            s => panic!("expected AVOIDING, got {}", s),
        }
    }

    #[test]
    fn test_avoiding_resumes_on_first_clear_tick() {
        let mut rig = Rig::new();
        rig.start_mowing();
        rig.obstacle.update(&RangeReadings::new(100.0, 20.0, 100.0));
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Avoiding);

        // Manoeuvre done with the obstacle still in view, waiting stopped
        let mut holding = false;
        for _ in 0..200 {
            rig.tick();
            if let Some(a) = rig.avoiding() {
                if a.is_holding() {
                    holding = true;
                    break;
                }
            }
        }
        assert!(holding);
        assert_eq!((rig.eqpt.left, rig.eqpt.right), (0, 0));

        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Avoiding);

        rig.obstacle.update(&RangeReadings::new(100.0, 100.0, 100.0));
        assert_eq!(rig.tick_until(StateKind::Mowing, 1), Some(1));
    }

    #[test]
    fn test_avoiding_drops_retry_once_clear() {
        let mut rig = Rig::new();
        rig.start_mowing();
        rig.obstacle.update(&RangeReadings::new(100.0, 20.0, 100.0));
        rig.tick();

        let mut retrying = false;
        for _ in 0..300 {
            rig.tick();
            if rig.avoiding().map(|a| a.attempts()) == Some(2) {
                retrying = true;
                break;
            }
        }
        assert!(retrying);
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Avoiding);

        rig.obstacle.update(&RangeReadings::new(100.0, 100.0, 100.0));
        assert_eq!(rig.tick_until(StateKind::Mowing, 1), Some(1));
    }

    #[test]
    fn test_avoiding_retries_early_on_new_side() {
        let mut rig = Rig::new();
        rig.start_mowing();
        rig.obstacle.update(&RangeReadings::new(100.0, 20.0, 100.0));
        rig.tick();

        for _ in 0..200 {
            rig.tick();
            if rig.avoiding().map(|a| a.is_holding()) == Some(true) {
                break;
            }
        }
        assert_eq!(rig.avoiding().map(|a| a.attempts()), Some(1));

        // Well inside the dwell, but the obstacle is now on the right
        rig.obstacle.update(&RangeReadings::new(100.0, 100.0, 20.0));
        rig.tick();
        let a = rig.avoiding().unwrap();
        assert_eq!(a.attempts(), 2);
        assert_eq!(a.direction(), crate::obstacle::AvoidDir::Left);
        assert!(!a.is_holding());
    }

    #[test]
    fn test_boundary_during_pattern_turns() {
        let mut rig = Rig::new();
        rig.start_mowing();
        rig.tick();

        rig.boundary = BoundaryStatus {
            zone: BoundaryZone::Outside,
            strength: 60.0,
            side: WireSide::Center,
        };
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Turning);
        assert!(rig.planner.is_perimeter_triggered());
        assert!(!rig.eqpt.blade);
    }

    #[test]
    fn test_state_timeout() {
        let mut rig = Rig::new();
        assert!(rig.mgr.return_to_base(&mut rig.planner, rig.now_s));
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Returning);

        rig.now_s = 301.0;
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Error);
        assert_eq!(rig.mgr.last_error(), Some("State timeout - stuck in RETURNING"));
        assert_eq!(rig.eqpt.left, 0);
    }

    #[test]
    fn test_calibration_timeout() {
        let mut rig = Rig::new();
        rig.mgr.start_calibration(CalibKind::Gyro, rig.now_s);

        // The estimator is never updated so the calibration can't complete
        rig.tick();
        assert!(rig.est.is_calibrating_gyro());

        rig.now_s = 31.0;
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Error);
        assert_eq!(rig.mgr.last_error(), Some("Calibration timeout"));
        assert!(!rig.est.is_calibrating_gyro());
    }

    #[test]
    fn test_mag_calibration_without_magnetometer() {
        let mut rig = Rig::new();
        rig.mgr.start_calibration(CalibKind::Magnetometer, rig.now_s);
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Idle);
        assert_eq!(rig.mgr.last_error(), None);
    }

    #[test]
    fn test_critical_battery() {
        let mut rig = Rig::new();
        rig.battery = BatteryStatus::from_voltage(9.8, &BatteryParams::default());
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Error);
        assert_eq!(rig.mgr.last_error(), Some("Critical battery"));
    }

    #[test]
    fn test_low_battery_returns() {
        let mut rig = Rig::new();
        rig.start_mowing();
        rig.tick();

        rig.battery = BatteryStatus::from_voltage(10.3, &BatteryParams::default());
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Returning);
        assert!(!rig.planner.is_active());

        // No further transition once returning
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Returning);
    }

    #[test]
    fn test_tilt_fault() {
        let mut rig = Rig::new();
        let p = 60f64.to_radians();
        let sample = ImuSample {
            accel_g: [-p.sin(), 0.0, p.cos()],
            ..ImuSample::default()
        };
        for _ in 0..200 {
            rig.est.update_with_sample(&sample, 0.05).unwrap();
        }
        assert!(rig.est.is_tilted());

        rig.start_mowing();
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Error);
        assert_eq!(rig.mgr.last_error(), Some("Robot tilted"));
    }

    #[test]
    fn test_error_stops_every_tick() {
        let mut rig = Rig::new();
        rig.start_mowing();
        rig.tick();
        rig.mgr.report_fault("Inertial sensor unresponsive");
        rig.mgr.report_fault("Second fault");
        rig.tick();
        assert_eq!(rig.mgr.last_error(), Some("Inertial sensor unresponsive"));

        let estops = rig.eqpt.num_estops;
        rig.eqpt.set_speed(120, 120);
        rig.eqpt.blade = true;
        rig.tick();
        assert_eq!((rig.eqpt.left, rig.eqpt.right), (0, 0));
        assert!(!rig.eqpt.blade);
        assert_eq!(rig.eqpt.num_estops, estops + 1);
        assert!(!rig.motion.is_moving());
    }

    #[test]
    fn test_recover() {
        let mut rig = Rig::new();
        assert!(!rig.mgr.recover(rig.now_s));

        rig.mgr.report_fault("Test fault");
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Error);

        assert!(!rig.start_mowing());
        assert!(!rig.mgr.enter_manual(rig.now_s));
        assert!(!rig.mgr.search_for_signal(rig.now_s));
        assert_eq!(rig.mgr.kind(), StateKind::Error);

        assert!(rig.mgr.recover(rig.now_s));
        assert_eq!(rig.mgr.kind(), StateKind::Idle);
        assert_eq!(rig.mgr.last_error(), None);
        assert!(rig.start_mowing());
    }

    #[test]
    fn test_same_state_is_noop() {
        let mut rig = Rig::new();
        rig.start_mowing();
        let entered_s = rig.mgr.entered_s();

        rig.tick();
        rig.tick();
        assert!(rig.start_mowing());
        assert_eq!(rig.mgr.entered_s(), entered_s);

        rig.mgr.enter_manual(rig.now_s);
        let entered_s = rig.mgr.entered_s();
        rig.tick();
        rig.mgr.enter_manual(rig.now_s);
        assert_eq!(rig.mgr.entered_s(), entered_s);
        assert_eq!(rig.mgr.previous_kind(), StateKind::Mowing);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut rig = Rig::new();
        rig.start_mowing();
        rig.tick();

        assert!(rig.mgr.pause_mowing(&mut rig.planner, rig.now_s));
        assert_eq!(rig.mgr.kind(), StateKind::Idle);
        assert!(!rig.planner.is_active());

        // Idle holds everything stopped
        rig.tick();
        assert_eq!((rig.eqpt.left, rig.eqpt.right), (0, 0));
        assert!(!rig.eqpt.blade);

        assert!(!rig.mgr.pause_mowing(&mut rig.planner, rig.now_s));
        assert!(!rig.mgr.stop_mowing(&mut rig.planner, rig.now_s));
    }

    #[test]
    fn test_signal_search() {
        let mut rig = Rig::new();
        rig.mgr.return_to_base(&mut rig.planner, rig.now_s);

        rig.boundary = BoundaryStatus::no_signal();
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::SearchingSignal);

        // Spiral out, blade off
        rig.tick();
        assert!(rig.eqpt.left > 0 && rig.eqpt.right > 0);
        assert!(!rig.eqpt.blade);

        rig.boundary = inside();
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Returning);

        // Give up after the search timeout
        rig.boundary = BoundaryStatus::no_signal();
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::SearchingSignal);
        rig.now_s += 121.0;
        rig.tick();
        assert_eq!(rig.mgr.kind(), StateKind::Error);
        assert_eq!(rig.mgr.last_error(), Some("Perimeter signal lost"));
    }

    #[test]
    fn test_wire_following() {
        let mut rig = Rig::new();
        rig.mgr.return_to_base(&mut rig.planner, rig.now_s);

        rig.tick();
        assert_eq!((rig.eqpt.left, rig.eqpt.right), (150, 150));

        rig.boundary.strength = 50.0;
        rig.tick();
        assert_eq!((rig.eqpt.left, rig.eqpt.right), (150, 120));

        rig.boundary.strength = 10.0;
        rig.tick();
        assert_eq!((rig.eqpt.left, rig.eqpt.right), (120, 150));

        rig.boundary.zone = BoundaryZone::Outside;
        rig.tick();
        assert_eq!((rig.eqpt.left, rig.eqpt.right), (-150, 150));
    }

    #[test]
    fn test_critical_obstacle_stops_forward_drive() {
        let mut rig = Rig::new();
        rig.mgr.return_to_base(&mut rig.planner, rig.now_s);
        rig.tick();
        assert!(rig.motion.is_driving_forward());

        rig.obstacle.update(&RangeReadings::new(10.0, 10.0, 10.0));
        assert!(rig.obstacle.is_critical());
        rig.tick();
        assert_eq!((rig.eqpt.left, rig.eqpt.right), (0, 0));
        assert_eq!(rig.mgr.kind(), StateKind::Returning);
    }
}

//! Implementations for the MotionCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{MotionCtrlParams, MotionMode, PidController, TurnDir};
use crate::eqpt::Drivetrain;
use util::maths::{ang_diff_deg, norm_angle_deg};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion control state.
#[derive(Debug, Clone)]
pub struct MotionCtrl {
    params: MotionCtrlParams,

    mode: MotionMode,

    /// Units: degrees
    target_heading_deg: f64,

    head_ctrl: PidController,

    dems: WheelDems,
}

/// Last wheel speeds sent to the drivetrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WheelDems {
    pub left: i32,
    pub right: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionCtrl {

    pub fn new(params: MotionCtrlParams) -> Self {
        Self {
            head_ctrl: PidController::new(
                params.k_p, params.k_i, params.k_d, params.integral_limit
            ),
            mode: MotionMode::Idle,
            target_heading_deg: 0.0,
            dems: WheelDems::default(),
            params,
        }
    }

    /// Create a new controller loading parameters from the given parameter file.
    pub fn init(params_path: &str) -> Result<Self, util::params::LoadError> {
        Ok(Self::new(util::params::load(params_path)?))
    }

    /// Hold the target heading while driving forwards at `speed`.
    ///
    /// Must be called every control tick. The heading error goes through the PID and the
    /// resulting correction is added to the left wheel and removed from the right, so a
    /// target clockwise of the current heading steers right.
    pub fn drive_straight<D>(&mut self, drive: &mut D, speed: i32, heading_deg: f64)
    where
        D: Drivetrain + ?Sized
    {
        self.enter_mode(MotionMode::DriveStraight);

        let err_deg = ang_diff_deg(heading_deg, self.target_heading_deg);
        let terms = self.head_ctrl.get_terms(err_deg);

        let limit = self.params.correction_limit;
        let correction = (terms.p + terms.i + terms.d).max(-limit).min(limit);

        let c = correction.round() as i32;
        let left = (speed + c).max(self.params.min_speed).min(self.params.max_speed);
        let right = (speed - c).max(self.params.min_speed).min(self.params.max_speed);

        trace!(
            "DriveStraight: err {:.2} deg, P {:.2} I {:.2} D {:.2}, wheels ({}, {})",
            err_deg, terms.p, terms.i, terms.d, left, right
        );

        self.command(drive, left, right);
    }

    /// Pivot towards `target_deg`.
    ///
    /// Returns `true` and stops the drivetrain once the heading is within tolerance.
    /// Should be called every tick until it returns `true`.
    pub fn turn_to_heading<D>(&mut self, drive: &mut D, target_deg: f64, heading_deg: f64) -> bool
    where
        D: Drivetrain + ?Sized
    {
        self.set_target_heading(target_deg);
        self.enter_mode(MotionMode::TurningToHeading);

        let err_deg = ang_diff_deg(heading_deg, self.target_heading_deg);

        if err_deg.abs() < self.params.heading_tolerance_deg {
            debug!("Turn to {:.1} deg complete (error {:.2} deg)", self.target_heading_deg, err_deg);
            self.stop(drive);
            return true;
        }

        let speed = self.params.turn_speed;
        self.pivot(drive, TurnDir::from_error(err_deg), speed);

        false
    }

    /// Open-loop pivot with no completion condition.
    pub fn turn_in_place<D>(&mut self, drive: &mut D, dir: TurnDir, speed: i32)
    where
        D: Drivetrain + ?Sized
    {
        self.enter_mode(MotionMode::TurningInPlace);
        self.pivot(drive, dir, speed);
    }

    /// Start reversing, returning how long the reverse must last to cover `distance_cm`.
    ///
    /// The duration comes from an assumed reverse speed, there is no distance feedback. The
    /// caller stops the mower once the duration has elapsed.
    ///
    /// Units: seconds
    pub fn back_up<D>(&mut self, drive: &mut D, distance_cm: f64) -> f64
    where
        D: Drivetrain + ?Sized
    {
        self.enter_mode(MotionMode::BackingUp);

        let speed = -self.params.backup_speed;
        self.command(drive, speed, speed);

        self.back_up_duration_s(distance_cm)
    }

    /// Time needed to reverse `distance_cm`.
    pub fn back_up_duration_s(&self, distance_cm: f64) -> f64 {
        if self.params.assumed_reverse_speed_cms > 0.0 {
            distance_cm.max(0.0) / self.params.assumed_reverse_speed_cms
        }
        else {
            0.0
        }
    }

    /// Command wheel speeds directly, bypassing heading control.
    pub fn drive_direct<D>(&mut self, drive: &mut D, left: i32, right: i32)
    where
        D: Drivetrain + ?Sized
    {
        self.enter_mode(MotionMode::Direct);
        self.command(drive, left, right);
    }

    /// Zero both wheels and clear the PID memory.
    pub fn stop<D>(&mut self, drive: &mut D)
    where
        D: Drivetrain + ?Sized
    {
        self.mode = MotionMode::Idle;
        self.head_ctrl.reset();
        self.command(drive, 0, 0);
    }

    /// Forget any motion without commanding the drivetrain, used after an emergency stop
    /// has already cut power.
    pub fn clear(&mut self) {
        self.mode = MotionMode::Idle;
        self.head_ctrl.reset();
        self.dems = WheelDems::default();
    }

    pub fn set_target_heading(&mut self, heading_deg: f64) {
        self.target_heading_deg = norm_angle_deg(heading_deg);
    }

    pub fn target_heading_deg(&self) -> f64 {
        self.target_heading_deg
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    pub fn wheel_dems(&self) -> WheelDems {
        self.dems
    }

    /// True if any wheel is being driven.
    pub fn is_moving(&self) -> bool {
        self.dems.left != 0 || self.dems.right != 0
    }

    pub fn is_turning(&self) -> bool {
        matches!(self.mode, MotionMode::TurningToHeading | MotionMode::TurningInPlace)
    }

    /// True if the last command drove the mower forwards.
    pub fn is_driving_forward(&self) -> bool {
        self.dems.left > 0 && self.dems.right > 0
    }

    pub fn pid(&self) -> &PidController {
        &self.head_ctrl
    }

    pub fn params(&self) -> &MotionCtrlParams {
        &self.params
    }

    fn enter_mode(&mut self, mode: MotionMode) {
        if self.mode != mode {
            trace!("Motion mode {} -> {}", self.mode, mode);
            self.mode = mode;
            self.head_ctrl.reset();
        }
    }

    fn pivot<D>(&mut self, drive: &mut D, dir: TurnDir, speed: i32)
    where
        D: Drivetrain + ?Sized
    {
        let speed = speed.abs();
        match dir {
            TurnDir::Right => self.command(drive, speed, -speed),
            TurnDir::Left => self.command(drive, -speed, speed),
        }
    }

    fn command<D>(&mut self, drive: &mut D, left: i32, right: i32)
    where
        D: Drivetrain + ?Sized
    {
        let max = self.params.max_speed;
        let dems = WheelDems {
            left: left.max(-max).min(max),
            right: right.max(-max).min(max),
        };

        drive.set_speed(dems.left, dems.right);
        self.dems = dems;
    }
}

impl Default for MotionCtrl {
    fn default() -> Self {
        Self::new(MotionCtrlParams::default())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct TestDrive {
        left: i32,
        right: i32,
        num_cmds: usize,
    }

    impl Drivetrain for TestDrive {
        fn set_speed(&mut self, left: i32, right: i32) {
            self.left = left;
            self.right = right;
            self.num_cmds += 1;
        }

        fn emergency_stop(&mut self) {
            self.left = 0;
            self.right = 0;
        }
    }

    #[test]
    fn test_drive_straight_steers_towards_target() {
        let mut ctrl = MotionCtrl::default();
        let mut drive = TestDrive::default();

        ctrl.set_target_heading(10.0);
        ctrl.drive_straight(&mut drive, 200, 0.0);
        assert_eq!(ctrl.mode(), MotionMode::DriveStraight);
        assert!(drive.left > drive.right, "should steer right: {} {}", drive.left, drive.right);

        ctrl.set_target_heading(350.0);
        ctrl.drive_straight(&mut drive, 200, 0.0);
        assert!(drive.left < drive.right, "should steer left: {} {}", drive.left, drive.right);

        // On target, no integral yet beyond the previous ticks, wheels within limits
        ctrl.stop(&mut drive);
        ctrl.set_target_heading(90.0);
        ctrl.drive_straight(&mut drive, 200, 90.0);
        assert_eq!((drive.left, drive.right), (200, 200));
    }

    #[test]
    fn test_drive_straight_clamps_wheels() {
        let mut ctrl = MotionCtrl::default();
        let mut drive = TestDrive::default();

        ctrl.set_target_heading(180.0);
        for _ in 0..100 {
            ctrl.drive_straight(&mut drive, 200, 0.0);
            assert!(drive.left <= 255 && drive.left >= 100);
            assert!(drive.right <= 255 && drive.right >= 100);
            assert!(ctrl.pid().integral().abs() <= 100.0);
        }
    }

    #[test]
    fn test_stop_clears_pid() {
        let mut ctrl = MotionCtrl::default();
        let mut drive = TestDrive::default();

        ctrl.set_target_heading(45.0);
        for _ in 0..10 {
            ctrl.drive_straight(&mut drive, 200, 0.0);
        }
        assert!(ctrl.pid().integral() != 0.0);

        ctrl.stop(&mut drive);
        assert_eq!(ctrl.pid().integral(), 0.0);
        assert_eq!(ctrl.pid().prev_error(), 0.0);
        assert_eq!((drive.left, drive.right), (0, 0));
        assert_eq!(ctrl.mode(), MotionMode::Idle);
        assert!(!ctrl.is_moving());
    }

    #[test]
    fn test_mode_entry_resets_pid() {
        let mut ctrl = MotionCtrl::default();
        let mut drive = TestDrive::default();

        ctrl.set_target_heading(45.0);
        ctrl.drive_straight(&mut drive, 200, 0.0);
        ctrl.drive_straight(&mut drive, 200, 0.0);
        assert_eq!(ctrl.pid().integral(), 90.0);

        ctrl.turn_in_place(&mut drive, TurnDir::Left, 150);
        assert_eq!(ctrl.pid().integral(), 0.0);
    }

    #[test]
    fn test_turn_to_heading() {
        let mut ctrl = MotionCtrl::default();
        let mut drive = TestDrive::default();

        assert!(!ctrl.turn_to_heading(&mut drive, 90.0, 0.0));
        assert_eq!((drive.left, drive.right), (180, -180));
        assert!(ctrl.is_turning());

        // Shortest way from 10 to 300 is anticlockwise
        assert!(!ctrl.turn_to_heading(&mut drive, 300.0, 10.0));
        assert_eq!((drive.left, drive.right), (-180, 180));

        assert!(ctrl.turn_to_heading(&mut drive, 300.0, 296.0));
        assert_eq!((drive.left, drive.right), (0, 0));
        assert_eq!(ctrl.mode(), MotionMode::Idle);

        // Tolerance across north
        assert!(ctrl.turn_to_heading(&mut drive, 358.0, 1.0));
    }

    #[test]
    fn test_back_up() {
        let mut ctrl = MotionCtrl::default();
        let mut drive = TestDrive::default();

        let duration_s = ctrl.back_up(&mut drive, 30.0);
        assert!((duration_s - 2.0).abs() < 1e-12);
        assert_eq!((drive.left, drive.right), (-170, -170));
        assert_eq!(ctrl.mode(), MotionMode::BackingUp);
        assert!(!ctrl.is_driving_forward());

        assert_eq!(ctrl.back_up_duration_s(-5.0), 0.0);
    }

    #[test]
    fn test_drive_direct_limits() {
        let mut ctrl = MotionCtrl::default();
        let mut drive = TestDrive::default();

        ctrl.drive_direct(&mut drive, 400, -300);
        assert_eq!((drive.left, drive.right), (255, -255));
        assert_eq!(ctrl.wheel_dems(), WheelDems { left: 255, right: -255 });
        assert_eq!(ctrl.mode(), MotionMode::Direct);
    }
}

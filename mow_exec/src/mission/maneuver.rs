//! # Timed open-loop manoeuvres
//!
//! A [`Maneuver`] is a queue of legs, each holding one drive command for a fixed number of
//! control ticks. It is advanced once per tick by the state that owns it, so a sequence
//! such as "reverse, pause, pivot" never blocks the control loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::VecDeque;

use log::trace;

use crate::{
    eqpt::Drivetrain,
    motion_ctrl::{MotionCtrl, TurnDir},
    CYCLE_PERIOD_S,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Maneuver {
    legs: VecDeque<Leg>,

    active: Option<ActiveLeg>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveLeg {
    leg: Leg,
    remaining_ticks: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// One step of a manoeuvre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leg {
    /// Reverse for the time needed to cover the distance at the assumed reverse speed
    Reverse { distance_cm: f64 },

    /// Stand still
    Hold { duration_s: f64 },

    /// Pivot on the spot
    Pivot { dir: TurnDir, speed: i32, duration_s: f64 },

    /// Drive forwards with equal wheel speeds
    Forward { speed: i32, duration_s: f64 },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Maneuver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a leg.
    pub fn then(mut self, leg: Leg) -> Self {
        self.legs.push_back(leg);
        self
    }

    /// Advance the manoeuvre by one tick.
    ///
    /// Returns `true`, with the mower stopped, once every leg has run.
    pub fn step<D>(&mut self, motion: &mut MotionCtrl, drive: &mut D) -> bool
    where
        D: Drivetrain + ?Sized,
    {
        loop {
            if let Some(ref mut active) = self.active {
                if active.remaining_ticks > 0 {
                    active.remaining_ticks -= 1;
                    return false;
                }
            }

            match self.legs.pop_front() {
                Some(leg) => {
                    let ticks = leg.start(motion, drive);
                    trace!("Manoeuvre leg {:?} for {} ticks", leg, ticks);
                    self.active = Some(ActiveLeg {
                        leg,
                        remaining_ticks: ticks,
                    });
                }
                None => {
                    self.active = None;
                    motion.stop(drive);
                    return true;
                }
            }
        }
    }

    /// True once every leg has run.
    pub fn is_finished(&self) -> bool {
        self.legs.is_empty() && self.active.map_or(true, |a| a.remaining_ticks == 0)
    }

    /// The leg currently being executed.
    pub fn current_leg(&self) -> Option<Leg> {
        self.active.map(|a| a.leg)
    }
}

impl Leg {
    /// Issue the leg's command, returning the number of ticks it lasts.
    fn start<D>(&self, motion: &mut MotionCtrl, drive: &mut D) -> u32
    where
        D: Drivetrain + ?Sized,
    {
        let duration_s = match *self {
            Leg::Reverse { distance_cm } => motion.back_up(drive, distance_cm),
            Leg::Hold { duration_s } => {
                motion.stop(drive);
                duration_s
            }
            Leg::Pivot { dir, speed, duration_s } => {
                motion.turn_in_place(drive, dir, speed);
                duration_s
            }
            Leg::Forward { speed, duration_s } => {
                motion.drive_direct(drive, speed, speed);
                duration_s
            }
        };

        ticks_for(duration_s)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Number of control ticks covering `duration_s`.
pub fn ticks_for(duration_s: f64) -> u32 {
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return 0;
    }

    // Tolerate round-off so 0.5 s is 10 ticks and not 11
    ((duration_s / CYCLE_PERIOD_S) - 1e-6).ceil() as u32
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct TestDrive {
        log: Vec<(i32, i32)>,
    }

    impl Drivetrain for TestDrive {
        fn set_speed(&mut self, left: i32, right: i32) {
            self.log.push((left, right));
        }

        fn emergency_stop(&mut self) {
            self.log.push((0, 0));
        }
    }

    #[test]
    fn test_ticks_for() {
        assert_eq!(ticks_for(0.5), 10);
        assert_eq!(ticks_for(1.0), 20);
        assert_eq!(ticks_for(0.06), 2);
        assert_eq!(ticks_for(0.0), 0);
        assert_eq!(ticks_for(-1.0), 0);
    }

    #[test]
    fn test_maneuver_sequence() {
        let mut motion = MotionCtrl::default();
        let mut drive = TestDrive::default();

        // 15 cm at 15 cm/s is 1 s
        let mut m = Maneuver::new()
            .then(Leg::Reverse { distance_cm: 15.0 })
            .then(Leg::Hold { duration_s: 0.5 })
            .then(Leg::Pivot { dir: TurnDir::Left, speed: 180, duration_s: 0.1 });

        let mut ticks = 0;
        while !m.step(&mut motion, &mut drive) {
            ticks += 1;
            assert!(ticks < 100);
        }

        // 20 + 10 + 2 ticks, finishing on the tick after the last leg
        assert_eq!(ticks, 32);
        assert!(m.is_finished());
        assert_eq!(
            drive.log,
            vec![(-170, -170), (0, 0), (-180, 180), (0, 0)]
        );
        assert!(!motion.is_moving());
    }

    #[test]
    fn test_zero_length_legs_skipped() {
        let mut motion = MotionCtrl::default();
        let mut drive = TestDrive::default();

        let mut m = Maneuver::new()
            .then(Leg::Hold { duration_s: 0.0 })
            .then(Leg::Forward { speed: 150, duration_s: 0.05 });

        assert!(!m.step(&mut motion, &mut drive));
        assert_eq!(m.current_leg(), Some(Leg::Forward { speed: 150, duration_s: 0.05 }));
        assert!(m.step(&mut motion, &mut drive));
    }
}

//! # Data Store
//!
//! The data store owns every navigation component and the latest sensor data, and runs one
//! control cycle at a time against a [`MowerEqpt`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::Utc;
use comms_if::{
    eqpt::{
        perimeter::BoundaryStatus,
        range::RangeReadings,
    },
    tm::MowerTm,
};
use log::{trace, warn};
use util::{params::LoadError, time::Cadence};

use crate::{
    battery::BatteryStatus,
    coverage::CoveragePlanner,
    eqpt::MowerEqpt,
    heading_est::{HeadingEstError, HeadingEstimator},
    mission::{MissionCtx, MissionMgr, MissionParams},
    motion_ctrl::MotionCtrl,
    obstacle::ObstacleAvoidance,
    params::MowExecParams,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Cause reported to the mission when the inertial sensor stops responding.
pub const IMU_FAULT_CAUSE: &str = "Inertial sensor unresponsive";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    // Modules
    pub heading_est: HeadingEstimator,
    pub motion_ctrl: MotionCtrl,
    pub planner: CoveragePlanner,
    pub obstacle: ObstacleAvoidance,
    pub mission: MissionMgr,

    // Latest sensor data
    pub ranges: RangeReadings,
    pub boundary: BoundaryStatus,
    pub battery: BatteryStatus,

    // Telemetry
    /// Latest telemetry snapshot
    pub tm: Option<MowerTm>,

    /// True if a new telemetry snapshot was produced during the last cycle
    pub tm_fresh: bool,

    // Monitoring counters
    /// Number of consecutive failed inertial reads
    pub num_consec_imu_failures: u32,

    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    cadences: Cadences,
}

/// The software timers of each subsystem.
#[derive(Debug, Clone, Copy)]
struct Cadences {
    range: Cadence,
    imu: Cadence,
    battery: Cadence,
    tm: Cadence,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataStoreError {
    #[error("Could not initialise the heading estimator: {0}")]
    HeadingEstInitError(HeadingEstError),

    #[error("Could not load the {0} parameters: {1}")]
    ParamLoadError(&'static str, LoadError),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Create a new data store from already constructed modules.
    pub fn new(
        exec_params: &MowExecParams,
        heading_est: HeadingEstimator,
        motion_ctrl: MotionCtrl,
        planner: CoveragePlanner,
        obstacle: ObstacleAvoidance,
        mission: MissionMgr,
    ) -> Self {
        Self {
            num_cycles: 0,
            heading_est,
            motion_ctrl,
            planner,
            obstacle,
            mission,
            ranges: RangeReadings::default(),
            boundary: BoundaryStatus::no_signal(),
            battery: BatteryStatus::default(),
            tm: None,
            tm_fresh: false,
            num_consec_imu_failures: 0,
            num_consec_cycle_overruns: 0,
            cadences: Cadences {
                range: Cadence::new(exec_params.range_period_s),
                imu: Cadence::new(exec_params.imu_period_s),
                battery: Cadence::new(exec_params.battery_period_s),
                tm: Cadence::new(exec_params.tm_period_s),
            },
        }
    }

    /// Create a new data store, loading every module's parameters from its file.
    pub fn init(exec_params: &MowExecParams, now_s: f64) -> Result<Self, DataStoreError> {
        let heading_est = HeadingEstimator::init("heading_est.toml")
            .map_err(DataStoreError::HeadingEstInitError)?;
        let motion_ctrl = MotionCtrl::init("motion_ctrl.toml")
            .map_err(|e| DataStoreError::ParamLoadError("MotionCtrl", e))?;
        let planner = CoveragePlanner::init("coverage.toml")
            .map_err(|e| DataStoreError::ParamLoadError("CoveragePlanner", e))?;
        let obstacle = ObstacleAvoidance::init("obstacle.toml")
            .map_err(|e| DataStoreError::ParamLoadError("ObstacleAvoidance", e))?;
        let mission_params: MissionParams = util::params::load("mission.toml")
            .map_err(|e| DataStoreError::ParamLoadError("MissionMgr", e))?;

        Ok(Self::new(
            exec_params,
            heading_est,
            motion_ctrl,
            planner,
            obstacle,
            MissionMgr::new(mission_params, now_s),
        ))
    }

    /// Run one control cycle at mission time `now_s`.
    ///
    /// Sensor failures are logged and absorbed: the previous data is kept and the cycle
    /// carries on.
    pub fn cycle(&mut self, eqpt: &mut dyn MowerEqpt, now_s: f64) {
        self.num_cycles += 1;
        self.tm_fresh = false;

        // ---- SENSING ----

        if self.cadences.range.is_due(now_s) {
            match eqpt.read_ranges() {
                Ok(r) => {
                    self.ranges = r;
                    self.obstacle.update(&r);
                }
                Err(e) => warn!("Could not read the range sensors: {}", e),
            }
        }

        let imu_dt_s = self.cadences.imu
            .since_last_s(now_s)
            .unwrap_or(self.cadences.imu.period_s());
        if self.cadences.imu.is_due(now_s) {
            self.update_heading(eqpt, imu_dt_s);
        }

        if self.cadences.battery.is_due(now_s) {
            match eqpt.read_voltage() {
                Ok(v) => {
                    self.battery = BatteryStatus::from_voltage(v, &self.mission.params().battery)
                }
                Err(e) => warn!("Could not read the battery voltage: {}", e),
            }
        }

        match eqpt.read_boundary() {
            Ok(b) => self.boundary = b,
            Err(e) => warn!("Could not read the perimeter receiver: {}", e),
        }

        // ---- MISSION ----

        let mut ctx = MissionCtx {
            est: &mut self.heading_est,
            motion: &mut self.motion_ctrl,
            planner: &mut self.planner,
            obstacle: &self.obstacle,
            eqpt: &mut *eqpt,
            boundary: self.boundary,
            battery: self.battery,
            now_s,
        };
        self.mission.step(&mut ctx);

        // ---- TELEMETRY ----

        if self.cadences.tm.is_due(now_s) {
            self.tm = Some(self.snapshot(eqpt, now_s));
            self.tm_fresh = true;
        }
    }

    /// Build a telemetry snapshot of the current status.
    pub fn snapshot(&self, eqpt: &dyn MowerEqpt, now_s: f64) -> MowerTm {
        let assessment = self.obstacle.assessment();
        let dems = self.motion_ctrl.wheel_dems();

        MowerTm {
            timestamp: Utc::now(),
            elapsed_s: now_s,

            state: self.mission.kind().to_string(),
            previous_state: self.mission.previous_kind().to_string(),
            time_in_state_s: self.mission.time_in_state_s(now_s),
            last_error: self.mission.last_error().map(String::from),

            heading_deg: self.heading_est.heading_deg(),
            pitch_deg: self.heading_est.pitch_deg(),
            roll_deg: self.heading_est.roll_deg(),
            target_heading_deg: self.motion_ctrl.target_heading_deg(),
            tilted: self.heading_est.is_tilted(),
            gyro_calibrated: self.heading_est.is_gyro_calibrated(),

            dist_left_cm: assessment.left_cm,
            dist_middle_cm: assessment.middle_cm,
            dist_right_cm: assessment.right_cm,
            obstacle: assessment.obstacle,
            obstacle_critical: assessment.critical,
            avoid_direction: assessment.direction.map(|d| d.to_string()),

            left_speed: dems.left,
            right_speed: dems.right,
            motion_mode: self.motion_ctrl.mode().to_string(),

            battery_v: self.battery.voltage_v,
            battery_pct: self.battery.percent,
            battery_low: self.battery.low,

            cutting: eqpt.blade_running(),
            safety_locked: eqpt.blade_safety_locked(),

            boundary_zone: format!("{:?}", self.boundary.zone),
            boundary_signal: self.boundary.has_signal(),
            boundary_strength: self.boundary.strength,
            boundary_side: format!("{:?}", self.boundary.side),

            row: self.planner.current_row(),
            total_rows: self.planner.total_rows(),
            pattern_complete: self.planner.is_pattern_complete(),
        }
    }

    fn update_heading(&mut self, eqpt: &mut dyn MowerEqpt, dt_s: f64) {
        self.heading_est.set_stationary(!self.motion_ctrl.is_moving());

        match self.heading_est.update(eqpt, dt_s) {
            Ok(()) => {
                self.num_consec_imu_failures = 0;
                trace!(
                    "Heading {:.2} deg, pitch {:.2} deg, roll {:.2} deg",
                    self.heading_est.heading_deg(),
                    self.heading_est.pitch_deg(),
                    self.heading_est.roll_deg()
                );
            }
            Err(e) => {
                self.num_consec_imu_failures += 1;
                warn!("Heading update failed: {}", e);

                if self.num_consec_imu_failures == self.mission.params().max_imu_failures {
                    self.mission.report_fault(IMU_FAULT_CAUSE);
                }
            }
        }
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(
            &MowExecParams::default(),
            HeadingEstimator::default(),
            MotionCtrl::default(),
            CoveragePlanner::default(),
            ObstacleAvoidance::default(),
            MissionMgr::new(MissionParams::default(), 0.0),
        )
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

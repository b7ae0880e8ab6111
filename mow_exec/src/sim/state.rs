//! Implementation of the simulated mower

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::{
    imu::ImuSample,
    perimeter::{BoundaryStatus, BoundaryZone, WireSide},
    range::RangeReadings,
};
use log::debug;
use nalgebra::Vector2;
use noise::{NoiseFn, Perlin, Seedable};

// Internal
use super::{SimObstacle, SimParams};
use crate::eqpt::{
    BatteryMonitor, BoundarySensor, CuttingActuator, Drivetrain, EqptError, InertialSource,
    RangeSensors,
};
use util::maths::{ang_diff_deg, norm_angle_deg};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest wheel speed accepted by the simulated power stage.
pub const SIM_MAX_SPEED: i32 = 255;

/// Wire bearings within this angle of straight ahead or behind are reported as centred.
///
/// Units: degrees
const WIRE_CENTRE_HALF_ANGLE_DEG: f64 = 20.0;

/// Reported distance when a range sensor starts inside an obstacle.
///
/// Units: centimeters
const CONTACT_RANGE_CM: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The simulated mower.
pub struct SimMower {
    params: SimParams,

    /// Units: meters
    position_m: Vector2<f64>,

    /// Compass heading.
    ///
    /// Units: radians
    heading_rad: f64,

    /// Clockwise turn rate.
    ///
    /// Units: radians/second
    yaw_rate_rads: f64,

    left_dem: i32,
    right_dem: i32,

    blade_running: bool,
    blade_safety_locked: bool,

    /// Units: volts
    battery_v: f64,

    /// Simulation time.
    ///
    /// Units: seconds
    time_s: f64,

    perlin: Perlin,

    faults: SimFaults,

    num_collisions: u64,
}

/// Injected equipment failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimFaults {
    pub imu: bool,
    pub ranges: bool,
    pub boundary: bool,
    pub battery: bool,

    /// The wire generator is switched off, the receiver hears nothing
    pub wire_off: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimMower {
    pub fn new(params: SimParams) -> Self {
        Self {
            position_m: Vector2::new(params.start_position_m[0], params.start_position_m[1]),
            heading_rad: norm_angle_deg(params.start_heading_deg).to_radians(),
            yaw_rate_rads: 0.0,
            left_dem: 0,
            right_dem: 0,
            blade_running: false,
            blade_safety_locked: false,
            battery_v: params.battery_initial_v,
            time_s: 0.0,
            perlin: Perlin::new().set_seed(params.noise_seed),
            faults: SimFaults::default(),
            num_collisions: 0,
            params,
        }
    }

    /// Create a new simulation loading parameters from the given parameter file.
    pub fn init(params_path: &str) -> Result<Self, util::params::LoadError> {
        Ok(Self::new(util::params::load(params_path)?))
    }

    /// Advance the simulation by `dt_s` seconds.
    pub fn step(&mut self, dt_s: f64) {
        if !(dt_s > 0.0) {
            return;
        }

        let v_left_ms = self.left_dem as f64 * self.params.speed_per_unit_ms;
        let v_right_ms = self.right_dem as f64 * self.params.speed_per_unit_ms;

        let speed_ms = 0.5 * (v_left_ms + v_right_ms);
        self.yaw_rate_rads = (v_left_ms - v_right_ms) / self.params.track_width_m;

        self.heading_rad = (self.heading_rad + self.yaw_rate_rads * dt_s)
            .rem_euclid(std::f64::consts::TAU);

        let new_position_m = self.position_m + self.forward() * speed_ms * dt_s;

        if self.obstacle_at(&new_position_m).is_some() {
            self.num_collisions += 1;
            debug!("Sim: collision at {:?}", new_position_m.as_slice());
        }
        else {
            self.position_m = new_position_m;
        }

        // ---- POWER ----

        let mut drain_vs = 0.0;
        if self.left_dem != 0 || self.right_dem != 0 {
            drain_vs += self.params.drive_drain_vs;
        }
        if self.blade_running {
            drain_vs += self.params.blade_drain_vs;
        }
        self.battery_v = (self.battery_v - drain_vs * dt_s).max(0.0);

        self.time_s += dt_s;
    }

    // ---- SETTERS ----

    pub fn set_pose(&mut self, position_m: [f64; 2], heading_deg: f64) {
        self.position_m = Vector2::new(position_m[0], position_m[1]);
        self.heading_rad = norm_angle_deg(heading_deg).to_radians();
    }

    pub fn set_blade_safety_lock(&mut self, locked: bool) {
        self.blade_safety_locked = locked;
        if locked {
            self.blade_running = false;
        }
    }

    pub fn set_battery_v(&mut self, voltage_v: f64) {
        self.battery_v = voltage_v;
    }

    pub fn faults_mut(&mut self) -> &mut SimFaults {
        &mut self.faults
    }

    // ---- GETTERS ----

    /// Units: meters
    pub fn position_m(&self) -> Vector2<f64> {
        self.position_m
    }

    /// Units: degrees
    pub fn heading_deg(&self) -> f64 {
        norm_angle_deg(self.heading_rad.to_degrees())
    }

    pub fn wheel_dems(&self) -> (i32, i32) {
        (self.left_dem, self.right_dem)
    }

    /// Units: volts
    pub fn battery_v(&self) -> f64 {
        self.battery_v
    }

    /// Units: seconds
    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn num_collisions(&self) -> u64 {
        self.num_collisions
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Signed distance to the perimeter wire, positive inside the lawn.
    ///
    /// Units: meters
    pub fn wire_distance_m(&self) -> f64 {
        let (x, y) = (self.position_m.x, self.position_m.y);
        let (w, l) = (self.params.lawn_width_m, self.params.lawn_length_m);

        if x >= 0.0 && x <= w && y >= 0.0 && y <= l {
            x.min(w - x).min(y).min(l - y)
        }
        else {
            -(self.position_m - self.nearest_wire_point()).norm()
        }
    }

    // ---- INTERNALS ----

    /// Unit vector along the mower's heading in the lawn frame.
    fn forward(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.sin(), self.heading_rad.cos())
    }

    fn obstacle_at(&self, point_m: &Vector2<f64>) -> Option<&SimObstacle> {
        self.params.obstacles.iter().find(|o| {
            (point_m - Vector2::new(o.centre_m[0], o.centre_m[1])).norm() < o.radius_m
        })
    }

    fn nearest_wire_point(&self) -> Vector2<f64> {
        let (x, y) = (self.position_m.x, self.position_m.y);
        let (w, l) = (self.params.lawn_width_m, self.params.lawn_length_m);

        let clamped = Vector2::new(x.max(0.0).min(w), y.max(0.0).min(l));
        if clamped != self.position_m {
            return clamped;
        }

        // Inside, project onto the closest edge
        let edges = [
            (x, Vector2::new(0.0, y)),
            (w - x, Vector2::new(w, y)),
            (y, Vector2::new(x, 0.0)),
            (l - y, Vector2::new(x, l)),
        ];
        edges
            .iter()
            .fold((f64::INFINITY, clamped), |best, &(d, p)| if d < best.0 { (d, p) } else { best })
            .1
    }

    /// Distance along a ray from the mower to the nearest obstacle, if any is hit.
    ///
    /// Units: meters
    fn cast_ray(&self, bearing_rad: f64) -> Option<f64> {
        let dir = Vector2::new(bearing_rad.sin(), bearing_rad.cos());

        self.params
            .obstacles
            .iter()
            .filter_map(|o| {
                let f = self.position_m - Vector2::new(o.centre_m[0], o.centre_m[1]);
                let b = f.dot(&dir);
                let c = f.norm_squared() - o.radius_m.powi(2);

                if c < 0.0 {
                    return Some(0.0);
                }

                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }

                let t = -b - disc.sqrt();
                if t >= 0.0 {
                    Some(t)
                }
                else {
                    None
                }
            })
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.min(t))))
    }

    /// Smooth pseudo-random noise for one channel at the current time.
    fn noise(&self, channel: u32, amplitude: f64) -> f64 {
        self.perlin.get([self.time_s * 7.3, channel as f64 + 0.5]) * amplitude
    }
}

impl InertialSource for SimMower {
    fn read_inertial(&mut self) -> Result<ImuSample, EqptError> {
        if self.faults.imu {
            return Err(EqptError::NoResponse("inertial sensor"));
        }

        let p = &self.params;

        let mag_ut = if p.has_magnetometer {
            let [horiz_ut, vert_ut] = p.mag_field_ut;
            Some([
                horiz_ut * self.heading_rad.cos() + self.noise(6, p.mag_noise_ut),
                -horiz_ut * self.heading_rad.sin() + self.noise(7, p.mag_noise_ut),
                vert_ut + self.noise(8, p.mag_noise_ut),
            ])
        }
        else {
            None
        };

        Ok(ImuSample {
            accel_g: [
                self.noise(0, p.accel_noise_g),
                self.noise(1, p.accel_noise_g),
                1.0 + self.noise(2, p.accel_noise_g),
            ],
            gyro_rads: [
                self.noise(3, p.gyro_noise_rads),
                self.noise(4, p.gyro_noise_rads),
                self.yaw_rate_rads + p.gyro_bias_rads + self.noise(5, p.gyro_noise_rads),
            ],
            mag_ut,
        })
    }

    fn has_magnetometer(&self) -> bool {
        self.params.has_magnetometer
    }
}

impl RangeSensors for SimMower {
    fn read_ranges(&mut self) -> Result<RangeReadings, EqptError> {
        if self.faults.ranges {
            return Err(EqptError::NoResponse("range sensors"));
        }

        let mut dists_cm = [0.0; 3];
        for (i, angle_deg) in self.params.range_angles_deg.iter().enumerate() {
            let bearing_rad = self.heading_rad + angle_deg.to_radians();

            dists_cm[i] = match self.cast_ray(bearing_rad) {
                Some(t) if t <= 0.0 => CONTACT_RANGE_CM,
                Some(t) if t * 100.0 <= self.params.range_max_cm => {
                    t * 100.0 + self.noise(10 + i as u32, self.params.range_noise_cm)
                }
                // No echo
                _ => 0.0,
            };
        }

        Ok(RangeReadings::new(dists_cm[0], dists_cm[1], dists_cm[2]))
    }
}

impl Drivetrain for SimMower {
    fn set_speed(&mut self, left: i32, right: i32) {
        self.left_dem = left.max(-SIM_MAX_SPEED).min(SIM_MAX_SPEED);
        self.right_dem = right.max(-SIM_MAX_SPEED).min(SIM_MAX_SPEED);
    }

    fn emergency_stop(&mut self) {
        self.left_dem = 0;
        self.right_dem = 0;
    }
}

impl CuttingActuator for SimMower {
    fn start_blade(&mut self) {
        if !self.blade_safety_locked {
            self.blade_running = true;
        }
    }

    fn stop_blade(&mut self) {
        self.blade_running = false;
    }

    fn blade_running(&self) -> bool {
        self.blade_running
    }

    fn blade_safety_locked(&self) -> bool {
        self.blade_safety_locked
    }

    fn blade_emergency_stop(&mut self) {
        self.blade_running = false;
    }
}

impl BatteryMonitor for SimMower {
    fn read_voltage(&mut self) -> Result<f64, EqptError> {
        if self.faults.battery {
            return Err(EqptError::NoResponse("battery monitor"));
        }

        Ok(self.battery_v)
    }
}

impl BoundarySensor for SimMower {
    fn read_boundary(&mut self) -> Result<BoundaryStatus, EqptError> {
        if self.faults.boundary {
            return Err(EqptError::NoResponse("perimeter receiver"));
        }
        if self.faults.wire_off {
            return Ok(BoundaryStatus::no_signal());
        }

        let dist_m = self.wire_distance_m();

        let zone = if dist_m.abs() <= self.params.on_wire_band_m {
            BoundaryZone::OnWire
        }
        else if dist_m > 0.0 {
            BoundaryZone::Inside
        }
        else {
            BoundaryZone::Outside
        };

        let strength = (100.0 * (1.0 - dist_m.abs() / self.params.wire_signal_range_m))
            .max(0.0)
            .min(100.0);

        let to_wire = self.nearest_wire_point() - self.position_m;
        let side = if to_wire.norm() < 1e-9 {
            WireSide::Center
        }
        else {
            let bearing_deg = to_wire.x.atan2(to_wire.y).to_degrees();
            let rel_deg = ang_diff_deg(self.heading_deg(), bearing_deg);

            if rel_deg.abs() < WIRE_CENTRE_HALF_ANGLE_DEG
                || rel_deg.abs() > 180.0 - WIRE_CENTRE_HALF_ANGLE_DEG
            {
                WireSide::Center
            }
            else if rel_deg > 0.0 {
                WireSide::Right
            }
            else {
                WireSide::Left
            }
        };

        Ok(BoundaryStatus {
            zone,
            strength,
            side,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::heading_est::HeadingEstimator;

    fn quiet_params() -> SimParams {
        SimParams {
            gyro_bias_rads: 0.0,
            gyro_noise_rads: 0.0,
            accel_noise_g: 0.0,
            mag_noise_ut: 0.0,
            range_noise_cm: 0.0,
            ..SimParams::default()
        }
    }

    #[test]
    fn test_drive_straight() {
        let mut sim = SimMower::new(quiet_params());
        sim.set_speed(200, 200);

        for _ in 0..20 {
            sim.step(0.05);
        }

        // 0.2 m/s for 1 s due north
        let p = sim.position_m();
        assert!((p.x - 2.0).abs() < 1e-9);
        assert!((p.y - 2.2).abs() < 1e-9);
        assert!(sim.heading_deg().abs() < 1e-9);
    }

    #[test]
    fn test_pivot_right() {
        let mut sim = SimMower::new(quiet_params());
        sim.set_speed(100, -100);
        sim.step(0.05);

        assert!(sim.heading_deg() > 0.0 && sim.heading_deg() < 90.0);
        assert!(sim.read_inertial().unwrap().gyro_rads[2] > 0.0);

        // Position doesn't change while pivoting
        assert!((sim.position_m() - Vector2::new(2.0, 2.0)).norm() < 1e-9);

        // Demands are limited by the power stage
        sim.set_speed(400, -400);
        assert_eq!(sim.wheel_dems(), (255, -255));
    }

    #[test]
    fn test_estimator_follows_sim_heading() {
        let mut sim = SimMower::new(SimParams::default());
        sim.set_pose([5.0, 5.0], 90.0);
        let mut est = HeadingEstimator::default();

        for _ in 0..600 {
            sim.step(0.05);
            est.update(&mut sim, 0.05).unwrap();
        }

        assert!(
            ang_diff_deg(est.heading_deg(), 90.0).abs() < 2.0,
            "estimated {}",
            est.heading_deg()
        );
        assert!(!est.is_tilted());
    }

    #[test]
    fn test_ranges() {
        let mut params = quiet_params();
        params.obstacles = vec![SimObstacle {
            centre_m: [2.0, 3.0],
            radius_m: 0.4,
        }];
        let mut sim = SimMower::new(params);

        let r = sim.read_ranges().unwrap();
        assert!((r.middle_cm - 60.0).abs() < 1e-6);
        assert_eq!(r.left_cm, 0.0);
        assert_eq!(r.right_cm, 0.0);

        // Turned away nothing is seen
        sim.set_pose([2.0, 2.0], 180.0);
        let r = sim.read_ranges().unwrap();
        assert_eq!(r, RangeReadings::new(0.0, 0.0, 0.0));

        sim.faults_mut().ranges = true;
        assert!(sim.read_ranges().is_err());
    }

    #[test]
    fn test_collision() {
        let mut params = quiet_params();
        params.obstacles = vec![SimObstacle {
            centre_m: [2.0, 2.5],
            radius_m: 0.3,
        }];
        let mut sim = SimMower::new(params);
        sim.set_speed(255, 255);

        for _ in 0..100 {
            sim.step(0.05);
        }

        assert!(sim.position_m().y < 2.2);
        assert!(sim.num_collisions() > 0);
    }

    #[test]
    fn test_boundary() {
        let mut sim = SimMower::new(quiet_params());

        // Well inside, heading north, wire to the left
        sim.set_pose([0.5, 5.0], 0.0);
        let b = sim.read_boundary().unwrap();
        assert_eq!(b.zone, BoundaryZone::Inside);
        assert!((b.strength - 50.0).abs() < 1e-9);
        assert_eq!(b.side, WireSide::Left);

        sim.set_pose([0.02, 5.0], 180.0);
        let b = sim.read_boundary().unwrap();
        assert_eq!(b.zone, BoundaryZone::OnWire);
        assert_eq!(b.side, WireSide::Right);

        sim.set_pose([-0.5, 5.0], 0.0);
        let b = sim.read_boundary().unwrap();
        assert_eq!(b.zone, BoundaryZone::Outside);
        assert!(b.is_breached());
        assert!((sim.wire_distance_m() + 0.5).abs() < 1e-9);

        // Far from the wire there's no strength left
        sim.set_pose([5.0, 7.0], 0.0);
        assert_eq!(sim.read_boundary().unwrap().strength, 0.0);

        sim.faults_mut().wire_off = true;
        assert!(!sim.read_boundary().unwrap().has_signal());
    }

    #[test]
    fn test_blade_and_battery() {
        let mut sim = SimMower::new(quiet_params());

        sim.set_blade_safety_lock(true);
        sim.start_blade();
        assert!(!sim.blade_running());

        sim.set_blade_safety_lock(false);
        sim.start_blade();
        assert!(sim.blade_running());

        sim.set_speed(200, 200);
        let v0 = sim.read_voltage().unwrap();
        for _ in 0..200 {
            sim.step(0.05);
        }
        let v1 = sim.read_voltage().unwrap();

        // 10 s of drive and blade drain
        assert!((v0 - v1 - 0.01).abs() < 1e-9);

        sim.blade_emergency_stop();
        assert!(!sim.blade_running());
    }
}

//! Coverage planner state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::Serialize;

// Internal
use super::CoverageParams;
use crate::motion_ctrl::TurnDir;
use util::maths::norm_angle_deg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Coverage planner.
///
/// Time is always supplied by the caller in seconds on the mission clock.
#[derive(Debug, Clone, Serialize)]
pub struct CoveragePlanner {
    #[serde(skip)]
    params: CoverageParams,

    row_width_cm: f64,

    current_row: u32,

    active: bool,

    complete: bool,

    turning: bool,

    /// Direction of the turn at the end of the current row
    turn_dir: TurnDir,

    /// Set when the boundary cut the current row short
    perimeter_triggered: bool,

    /// Mission time at which the current row started.
    ///
    /// Units: seconds
    row_start_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CoveragePlanner {

    pub fn new(params: CoverageParams) -> Self {
        Self {
            row_width_cm: params.row_width_cm,
            current_row: 0,
            active: false,
            complete: false,
            turning: false,
            turn_dir: TurnDir::Right,
            perimeter_triggered: false,
            row_start_s: 0.0,
            params,
        }
    }

    /// Create a new planner loading parameters from the given parameter file.
    pub fn init(params_path: &str) -> Result<Self, util::params::LoadError> {
        Ok(Self::new(util::params::load(params_path)?))
    }

    /// Start a new pattern from the first row.
    pub fn start_new_pattern(&mut self, now_s: f64) {
        self.reset();
        self.active = true;
        self.row_start_s = now_s;

        info!(
            "Starting new mowing pattern: {} rows, {:.0} cm apart",
            self.params.max_rows, self.row_width_cm
        );
    }

    /// Deactivate the pattern, keeping the row progress.
    pub fn stop_pattern(&mut self) {
        if self.active {
            info!("Mowing pattern stopped at row {}", self.current_row);
        }
        self.active = false;
        self.turning = false;
    }

    /// Reactivate a stopped pattern, the current row starts over at `now_s`.
    pub fn resume_pattern(&mut self, now_s: f64) -> bool {
        if self.complete || self.current_row >= self.params.max_rows {
            return false;
        }

        self.active = true;
        self.turning = false;
        self.row_start_s = now_s;
        info!("Resuming mowing pattern at row {}", self.current_row);

        true
    }

    /// Back to the initial, inactive state.
    pub fn reset(&mut self) {
        self.current_row = 0;
        self.active = false;
        self.complete = false;
        self.turning = false;
        self.turn_dir = TurnDir::Right;
        self.perimeter_triggered = false;
        self.row_start_s = 0.0;
        debug!("Coverage planner reset");
    }

    /// True once the current row is finished, either by estimated length, by the time cap
    /// or because the boundary was reached.
    pub fn should_turn(&self, now_s: f64) -> bool {
        if !self.active || self.turning {
            return false;
        }

        self.perimeter_triggered
            || self.estimated_row_distance_cm(now_s) >= self.params.row_length_max_cm
            || self.row_elapsed_s(now_s) >= self.params.row_time_cap_s
    }

    /// Advance to the next row.
    pub fn next_row(&mut self, now_s: f64) {
        if !self.active {
            return;
        }

        self.current_row += 1;
        self.row_start_s = now_s;
        self.turn_dir = self.turn_dir.opposite();
        self.perimeter_triggered = false;

        info!(
            "Moving to row {} - heading {:.1} deg",
            self.current_row,
            self.target_heading_deg()
        );

        if self.current_row >= self.params.max_rows {
            info!("Mowing pattern complete");
            self.complete = true;
            self.active = false;
        }
    }

    /// The boundary was reached, end the current row early.
    pub fn perimeter_reached(&mut self) {
        if self.active && !self.perimeter_triggered {
            info!("Boundary reached on row {}", self.current_row);
            self.perimeter_triggered = true;
        }
    }

    /// Acknowledge a boundary trigger.
    pub fn clear_perimeter_trigger(&mut self) {
        self.perimeter_triggered = false;
    }

    pub fn is_perimeter_triggered(&self) -> bool {
        self.perimeter_triggered
    }

    pub fn start_turn(&mut self) {
        self.turning = true;
        debug!("Row end turn started ({:?})", self.turn_dir);
    }

    pub fn complete_turn(&mut self) {
        self.turning = false;
        debug!("Row end turn complete");
    }

    pub fn is_turning(&self) -> bool {
        self.turning
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_pattern_complete(&self) -> bool {
        self.complete
    }

    pub fn current_row(&self) -> u32 {
        self.current_row
    }

    pub fn total_rows(&self) -> u32 {
        self.params.max_rows
    }

    /// Direction of the turn at the end of the current row.
    pub fn turn_direction(&self) -> TurnDir {
        self.turn_dir
    }

    /// Heading of the current row.
    ///
    /// Units: degrees
    pub fn target_heading_deg(&self) -> f64 {
        self.row_heading_deg(self.current_row)
    }

    /// Heading of the row after the current one.
    ///
    /// Units: degrees
    pub fn next_row_heading_deg(&self) -> f64 {
        self.row_heading_deg(self.current_row + 1)
    }

    /// Heading of any row, rows of the same parity share a heading.
    pub fn row_heading_deg(&self, row: u32) -> f64 {
        if row % 2 == 0 {
            norm_angle_deg(self.params.base_heading_deg)
        }
        else {
            norm_angle_deg(self.params.base_heading_deg + 180.0)
        }
    }

    pub fn set_row_width(&mut self, row_width_cm: f64) {
        if row_width_cm.is_finite() && row_width_cm > 0.0 {
            self.row_width_cm = row_width_cm;
            info!("Row width set to {:.0} cm", row_width_cm);
        }
    }

    /// Units: centimetres
    pub fn row_width_cm(&self) -> f64 {
        self.row_width_cm
    }

    /// Units: seconds
    pub fn row_elapsed_s(&self, now_s: f64) -> f64 {
        (now_s - self.row_start_s).max(0.0)
    }

    /// Units: centimetres
    pub fn estimated_row_distance_cm(&self, now_s: f64) -> f64 {
        self.row_elapsed_s(now_s) * self.params.assumed_speed_cms
    }

    pub fn params(&self) -> &CoverageParams {
        &self.params
    }
}

impl Default for CoveragePlanner {
    fn default() -> Self {
        Self::new(CoverageParams::default())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_alternating_rows() {
        let mut planner = CoveragePlanner::default();
        planner.start_new_pattern(0.0);

        let mut headings = vec![planner.target_heading_deg()];
        let mut dirs = vec![planner.turn_direction()];
        for i in 1..20 {
            planner.next_row(i as f64);
            headings.push(planner.target_heading_deg());
            dirs.push(planner.turn_direction());
        }

        assert_eq!(dirs[0], TurnDir::Right);
        for n in 1..headings.len() {
            assert_ne!(headings[n], headings[n - 1]);
            assert_ne!(dirs[n], dirs[n - 1]);
            if n >= 2 {
                assert_eq!(headings[n], headings[n - 2]);
            }
        }
        assert_eq!(headings[0], 0.0);
        assert_eq!(headings[1], 180.0);
    }

    #[test]
    fn test_next_row_heading() {
        let mut planner = CoveragePlanner::default();
        planner.start_new_pattern(0.0);

        let next = planner.next_row_heading_deg();
        planner.next_row(1.0);
        assert_eq!(planner.target_heading_deg(), next);
    }

    #[test]
    fn test_should_turn() {
        let mut planner = CoveragePlanner::default();
        assert!(!planner.should_turn(100.0));

        planner.start_new_pattern(10.0);
        assert!(!planner.should_turn(10.0));

        // 500 cm at 20 cm/s
        assert!(!planner.should_turn(34.9));
        assert!(planner.should_turn(35.0));

        planner.start_turn();
        assert!(!planner.should_turn(40.0));
        planner.complete_turn();
        planner.next_row(40.0);
        assert!(!planner.should_turn(41.0));
    }

    #[test]
    fn test_time_cap() {
        let mut params = CoverageParams::default();
        params.row_length_max_cm = 10_000.0;
        let mut planner = CoveragePlanner::new(params);

        planner.start_new_pattern(0.0);
        assert!(!planner.should_turn(29.9));
        assert!(planner.should_turn(30.0));
    }

    #[test]
    fn test_perimeter_trigger() {
        let mut planner = CoveragePlanner::default();
        planner.start_new_pattern(0.0);

        planner.perimeter_reached();
        assert!(planner.should_turn(1.0));

        planner.clear_perimeter_trigger();
        assert!(!planner.should_turn(1.0));

        planner.perimeter_reached();
        planner.next_row(2.0);
        assert!(!planner.is_perimeter_triggered());
    }

    #[test]
    fn test_pattern_complete() {
        let mut params = CoverageParams::default();
        params.max_rows = 3;
        let mut planner = CoveragePlanner::new(params);

        planner.start_new_pattern(0.0);
        planner.next_row(1.0);
        planner.next_row(2.0);
        assert!(!planner.is_pattern_complete());
        planner.next_row(3.0);

        assert!(planner.is_pattern_complete());
        assert!(!planner.is_active());
        assert_eq!(planner.current_row(), 3);
        assert!(!planner.should_turn(100.0));
        assert!(!planner.resume_pattern(100.0));

        // Inactive, rows do not advance
        planner.next_row(4.0);
        assert_eq!(planner.current_row(), 3);
    }

    #[test]
    fn test_resume() {
        let mut planner = CoveragePlanner::default();
        planner.start_new_pattern(0.0);
        planner.next_row(10.0);
        planner.stop_pattern();
        assert!(!planner.should_turn(100.0));

        assert!(planner.resume_pattern(100.0));
        assert_eq!(planner.current_row(), 1);
        assert!(!planner.should_turn(101.0));
    }
}

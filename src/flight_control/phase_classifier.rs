use super::{FlightPhase, FlightSnapshot};
use std::collections::VecDeque;

/// Tunable guard thresholds for every edge of the phase graph.
///
/// Values are per aircraft class; the defaults describe a light twin / small
/// airliner profile.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GuardThresholds {
    /// Number of consecutive samples a guard has to hold before it fires.
    pub confirm_samples: usize,
    /// `PREFLIGHT -> TAXI`: minimum ground speed while on ground, knots.
    pub taxi_min_ground_speed: f64,
    /// `TAXI -> TAKEOFF`: minimum climb rate once airborne, feet per minute.
    pub takeoff_min_vertical_speed: f64,
    /// `TAKEOFF -> CLIMB`: minimum sustained climb rate, feet per minute.
    pub climb_min_vertical_speed: f64,
    /// `TAKEOFF -> CLIMB`: altitude at which the initial climb is over, feet.
    pub climb_min_altitude: f64,
    /// `TAKEOFF -> CLIMB`: gear at or below this counts as retracted.
    pub gear_retracted_max: f64,
    /// `CLIMB -> CRUISE`: maximum absolute vertical speed for level flight.
    pub cruise_max_vertical_speed: f64,
    /// `CRUISE -> DESCENT`: minimum sink rate, feet per minute (positive).
    pub descent_min_vertical_speed: f64,
    /// `DESCENT -> APPROACH`: gear at or above this counts as extended.
    pub gear_extended_min: f64,
    /// `DESCENT -> APPROACH`: flaps at or above this count as extended.
    pub flaps_extended_min: f64,
    /// `APPROACH -> LANDING`: minimum ground speed at touchdown, knots.
    pub landing_min_ground_speed: f64,
    /// `LANDING -> ROLLOUT`: minimum ground speed loss per sample, knots.
    pub rollout_min_deceleration: f64,
    /// `ROLLOUT -> TAXI`: ground speed at or below which the roll is over.
    pub taxi_max_ground_speed: f64,
}

impl Default for GuardThresholds {
    fn default() -> Self {
        Self {
            confirm_samples: 3,
            taxi_min_ground_speed: 3.0,
            takeoff_min_vertical_speed: 500.0,
            climb_min_vertical_speed: 300.0,
            climb_min_altitude: 1500.0,
            gear_retracted_max: 0.1,
            cruise_max_vertical_speed: 200.0,
            descent_min_vertical_speed: 300.0,
            gear_extended_min: 0.9,
            flaps_extended_min: 0.1,
            landing_min_ground_speed: 40.0,
            rollout_min_deceleration: 0.5,
            taxi_max_ground_speed: 30.0,
        }
    }
}

/// Fixed-capacity ring buffer of recent guard evaluations.
#[derive(Debug, Clone)]
struct GuardWindow {
    samples: VecDeque<bool>,
    capacity: usize,
}

impl GuardWindow {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    /// Records one evaluation and reports whether the last `capacity`
    /// evaluations all held.
    fn push(&mut self, holds: bool) -> bool {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(holds);
        self.samples.len() == self.capacity && self.samples.iter().all(|h| *h)
    }

    fn clear(&mut self) { self.samples.clear(); }
}

/// Debounced flight phase classifier.
///
/// Only the single successor of the previous phase is ever considered, so a
/// call can never skip a step of the phase graph. Besides the guard window it
/// remembers the previous ground speed for the deceleration guard.
#[derive(Debug, Clone)]
pub struct PhaseClassifier {
    thresholds: GuardThresholds,
    window: GuardWindow,
    tracking: Option<FlightPhase>,
    last_ground_speed: Option<f64>,
}

impl PhaseClassifier {
    pub fn new(thresholds: GuardThresholds) -> Self {
        let window = GuardWindow::new(thresholds.confirm_samples);
        Self { thresholds, window, tracking: None, last_ground_speed: None }
    }

    /// Classifies `snapshot` given the last confirmed phase.
    ///
    /// Returns `previous` unless the guard towards its successor held for
    /// `confirm_samples` consecutive calls. Missing telemetry counts as a
    /// failed guard.
    pub fn classify(&mut self, previous: FlightPhase, snapshot: &FlightSnapshot) -> FlightPhase {
        if self.tracking != Some(previous) {
            self.window.clear();
            self.tracking = Some(previous);
        }
        let holds = self.guard_holds(previous, snapshot).unwrap_or(false);
        self.last_ground_speed = snapshot.ground_speed();

        if self.window.push(holds) {
            let next = previous.successor();
            self.window.clear();
            self.tracking = Some(next);
            next
        } else {
            previous
        }
    }

    /// Evaluates the guard of the edge leaving `from`. `None` when a field
    /// the guard depends on is missing.
    fn guard_holds(&self, from: FlightPhase, s: &FlightSnapshot) -> Option<bool> {
        let t = &self.thresholds;
        let holds = match from {
            FlightPhase::Preflight => {
                s.on_ground()? && s.ground_speed()? >= t.taxi_min_ground_speed
            }
            FlightPhase::Taxi => {
                !s.on_ground()? && s.vertical_speed()? > t.takeoff_min_vertical_speed
            }
            FlightPhase::Takeoff => {
                let above_floor = s.altitude().map(|alt| alt >= t.climb_min_altitude);
                let gear_up = s.gear_position().map(|gear| gear <= t.gear_retracted_max);
                let clear_of_ground = match (above_floor, gear_up) {
                    (None, None) => return None,
                    (a, g) => a.unwrap_or(false) || g.unwrap_or(false),
                };
                !s.on_ground()? && s.vertical_speed()? > t.climb_min_vertical_speed && clear_of_ground
            }
            FlightPhase::Climb => {
                !s.on_ground()? && s.vertical_speed()?.abs() <= t.cruise_max_vertical_speed
            }
            FlightPhase::Cruise => {
                !s.on_ground()? && s.vertical_speed()? <= -t.descent_min_vertical_speed
            }
            FlightPhase::Descent => {
                let gear_down = s.gear_position().is_some_and(|gear| gear >= t.gear_extended_min);
                let flaps_out = s.flap_position().is_some_and(|flaps| flaps >= t.flaps_extended_min);
                if s.gear_position().is_none() && s.flap_position().is_none() {
                    return None;
                }
                !s.on_ground()? && s.vertical_speed()? < 0.0 && (gear_down || flaps_out)
            }
            FlightPhase::Approach => {
                s.on_ground()? && s.ground_speed()? >= t.landing_min_ground_speed
            }
            FlightPhase::Landing => {
                let previous = self.last_ground_speed?;
                s.on_ground()? && previous - s.ground_speed()? >= t.rollout_min_deceleration
            }
            FlightPhase::Rollout => {
                s.on_ground()? && s.ground_speed()? <= t.taxi_max_ground_speed
            }
        };
        Some(holds)
    }
}

impl Default for PhaseClassifier {
    fn default() -> Self { Self::new(GuardThresholds::default()) }
}

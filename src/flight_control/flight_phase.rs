use std::collections::HashMap;
use std::sync::LazyLock;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Discrete stage of a flight used to gate which commentary is valid.
///
/// Exactly one phase is current per flight session; the
/// [`PhaseClassifier`](super::PhaseClassifier) owns every transition.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum FlightPhase {
    #[default]
    Preflight,
    Taxi,
    Takeoff,
    Climb,
    Cruise,
    Descent,
    Approach,
    Landing,
    Rollout,
}

/// The fixed directed phase graph. Every phase has exactly one successor,
/// `Rollout -> Taxi` closes the circuit for touch-and-go scenarios.
static PHASE_GRAPH: LazyLock<HashMap<FlightPhase, FlightPhase>> = LazyLock::new(|| {
    let edges = [
        (FlightPhase::Preflight, FlightPhase::Taxi),
        (FlightPhase::Taxi, FlightPhase::Takeoff),
        (FlightPhase::Takeoff, FlightPhase::Climb),
        (FlightPhase::Climb, FlightPhase::Cruise),
        (FlightPhase::Cruise, FlightPhase::Descent),
        (FlightPhase::Descent, FlightPhase::Approach),
        (FlightPhase::Approach, FlightPhase::Landing),
        (FlightPhase::Landing, FlightPhase::Rollout),
        (FlightPhase::Rollout, FlightPhase::Taxi),
    ];
    edges.into_iter().collect()
});

impl FlightPhase {
    /// The only phase reachable from `self` in one transition.
    pub fn successor(self) -> FlightPhase { PHASE_GRAPH[&self] }

    /// Whether `next` is `self` or its direct successor.
    pub fn can_reach_in_one_step(self, next: FlightPhase) -> bool {
        self == next || self.successor() == next
    }

    /// Phases the bot-control side treats as high workload.
    pub fn is_critical(self) -> bool {
        matches!(self, FlightPhase::Takeoff | FlightPhase::Landing)
    }
}

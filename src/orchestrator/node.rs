use crate::http_handler::EventType;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use strum_macros::{Display, EnumString};

/// Registration record of a service node.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeDescriptor {
    node_id: String,
    base_url: String,
    /// Event types the node accepts.
    #[serde(default)]
    capabilities: BTreeSet<EventType>,
    /// Whether the overall health summary depends on this node.
    #[serde(default = "default_required")]
    required: bool,
}

fn default_required() -> bool { true }

impl NodeDescriptor {
    pub fn new<I>(node_id: &str, base_url: &str, capabilities: I) -> Self
    where I: IntoIterator<Item = EventType> {
        Self {
            node_id: node_id.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            capabilities: capabilities.into_iter().collect(),
            required: true,
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn node_id(&self) -> &str { &self.node_id }
    pub fn base_url(&self) -> &str { &self.base_url }
    pub fn capabilities(&self) -> &BTreeSet<EventType> { &self.capabilities }
    pub fn is_required(&self) -> bool { self.required }
    pub fn accepts(&self, event_type: EventType) -> bool { self.capabilities.contains(&event_type) }
}

/// Observed health of a registered node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Registered, not yet confirmed either way.
    #[default]
    Unknown,
    Healthy,
    /// Recently failed, still routed to.
    Degraded,
    /// Skipped by routing until it recovers.
    Unreachable,
}

/// A `(from, to)` health transition.
pub type Transition = (HealthState, HealthState);

/// Health state machine of one node.
///
/// Transitions only happen on runs of consecutive results: `k` successes
/// make a node healthy, `k` failures make it unreachable. The only single
/// sample transition is `Healthy -> Degraded`.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct NodeHealth {
    state: HealthState,
    consecutive_successes: u32,
    consecutive_failures: u32,
    delivery_failures: u32,
    total_probes: u64,
    total_failures: u64,
    last_probe_at: Option<DateTime<Utc>>,
    last_success_at: Option<DateTime<Utc>>,
    unreachable_since: Option<DateTime<Utc>>,
}

impl NodeHealth {
    pub fn state(&self) -> HealthState { self.state }
    pub fn consecutive_successes(&self) -> u32 { self.consecutive_successes }
    pub fn consecutive_failures(&self) -> u32 { self.consecutive_failures }
    pub fn delivery_failures(&self) -> u32 { self.delivery_failures }
    pub fn unreachable_since(&self) -> Option<DateTime<Utc>> { self.unreachable_since }

    /// Folds one probe result into the state machine.
    pub fn record_probe(&mut self, ok: bool, k: u32, now: DateTime<Utc>) -> Option<Transition> {
        self.total_probes += 1;
        self.last_probe_at = Some(now);
        let next = if ok {
            self.consecutive_successes += 1;
            self.consecutive_failures = 0;
            self.last_success_at = Some(now);
            match self.state {
                HealthState::Healthy => None,
                _ if self.consecutive_successes >= k => Some(HealthState::Healthy),
                _ => None,
            }
        } else {
            self.consecutive_failures += 1;
            self.consecutive_successes = 0;
            self.total_failures += 1;
            match self.state {
                HealthState::Unreachable => None,
                HealthState::Healthy => Some(HealthState::Degraded),
                _ if self.consecutive_failures >= k => Some(HealthState::Unreachable),
                _ => None,
            }
        };
        next.map(|to| self.enter(to, now))
    }

    /// Folds one delivery attempt into the state machine. Only failures
    /// while degraded count: a degraded node whose failed deliveries reach
    /// `burst_limit` is marked unreachable without waiting for the next
    /// probes.
    pub fn record_delivery(
        &mut self,
        ok: bool,
        burst_limit: u32,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        if ok {
            self.delivery_failures = 0;
            return None;
        }
        if self.state != HealthState::Degraded {
            return None;
        }
        self.delivery_failures += 1;
        if self.delivery_failures >= burst_limit {
            self.consecutive_successes = 0;
            return Some(self.enter(HealthState::Unreachable, now));
        }
        None
    }

    fn enter(&mut self, to: HealthState, now: DateTime<Utc>) -> Transition {
        let from = self.state;
        self.state = to;
        match to {
            HealthState::Unreachable => self.unreachable_since = Some(now),
            HealthState::Healthy => {
                self.unreachable_since = None;
                self.delivery_failures = 0;
            }
            HealthState::Degraded => {
                self.unreachable_since = None;
                self.delivery_failures = 0;
            }
            HealthState::Unknown => self.unreachable_since = None,
        }
        (from, to)
    }
}

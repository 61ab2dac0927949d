use super::event_router::{EventLog, EventRecord, EventStats, deliver_all};
use super::health_monitor::probe_all;
use super::node::{HealthState, NodeDescriptor, NodeHealth, Transition};
use super::{NodeTable, NodeTransport};
use crate::config::OrchestratorConfig;
use crate::engine::EventOutlet;
use crate::http_handler::{
    DeliveryReport, Event, NodeComponent, NodeError, ProbeStatus, ResponseError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use strum_macros::Display;
use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Health of the whole deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    /// Every required node is healthy.
    Healthy,
    /// Some required node is not healthy.
    Degraded,
    /// Nodes are registered but none of them is healthy.
    Critical,
}

/// Serialisable view of a registered node.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeView {
    #[serde(flatten)]
    pub descriptor: NodeDescriptor,
    pub health: NodeHealth,
    pub registered_at: DateTime<Utc>,
}

/// Owner of the node table: registers nodes, polls their health and routes
/// events between them.
///
/// All registry and health state lives in here; it is set up with the first
/// registration and dropped by [`Orchestrator::teardown`].
pub struct Orchestrator {
    settings: OrchestratorConfig,
    transport: Arc<dyn NodeTransport>,
    nodes: RwLock<NodeTable>,
    events: Mutex<EventLog>,
    initialised: AtomicBool,
    shut_down: AtomicBool,
    started_at: DateTime<Utc>,
}

impl Orchestrator {
    pub fn new(settings: OrchestratorConfig, transport: Arc<dyn NodeTransport>) -> Self {
        let history_limit = settings.history_limit;
        Self {
            settings,
            transport,
            nodes: RwLock::new(NodeTable::default()),
            events: Mutex::new(EventLog::new(history_limit)),
            initialised: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
            started_at: Utc::now(),
        }
    }

    pub fn settings(&self) -> &OrchestratorConfig { &self.settings }

    /// Registers the nodes listed in the configuration.
    pub async fn seed(&self) {
        for descriptor in self.settings.nodes.clone() {
            self.register(descriptor).await;
        }
    }

    /// Registers `descriptor`; a known id is reset to a fresh `Unknown`
    /// instance. Returns whether an entry was replaced.
    pub async fn register(&self, descriptor: NodeDescriptor) -> bool {
        if !self.initialised.swap(true, Ordering::AcqRel) {
            info!("Node table initialised");
        }
        let node_id = descriptor.node_id().to_string();
        let base_url = descriptor.base_url().to_string();
        let replaced = self.nodes.write().await.register(descriptor, Utc::now());
        if replaced {
            info!("Node {node_id} re-registered at {base_url}, counters reset");
        } else {
            info!("Node {node_id} registered at {base_url}");
        }
        replaced
    }

    /// Removes `node_id`. Unknown ids are ignored.
    pub async fn deregister(&self, node_id: &str) -> bool {
        let removed = self.nodes.write().await.deregister(node_id);
        if removed {
            info!("Node {node_id} deregistered");
        }
        removed
    }

    pub async fn node_state(&self, node_id: &str) -> Option<HealthState> {
        self.nodes.read().await.get(node_id).map(super::node_table::NodeEntry::state)
    }

    pub async fn nodes(&self) -> Vec<NodeView> {
        self.nodes
            .read()
            .await
            .iter()
            .map(|e| NodeView {
                descriptor: e.descriptor().clone(),
                health: e.health().clone(),
                registered_at: e.registered_at(),
            })
            .collect()
    }

    /// One health sweep at the current time.
    pub async fn poll_health(&self) { self.poll_health_at(Utc::now()).await; }

    /// Probes every node concurrently, then applies the results one by one.
    /// Results for nodes re-registered or removed meanwhile are discarded.
    pub async fn poll_health_at(&self, now: DateTime<Utc>) {
        let targets: Vec<(NodeDescriptor, u64)> = self
            .nodes
            .read()
            .await
            .iter()
            .map(|e| (e.descriptor().clone(), e.generation()))
            .collect();
        if targets.is_empty() {
            return;
        }
        let outcomes = probe_all(
            &self.transport,
            targets,
            self.settings.probe_timeout(),
            self.settings.max_concurrent_probes,
        )
        .await;

        let k = self.settings.consecutive_threshold;
        let mut table = self.nodes.write().await;
        for outcome in outcomes {
            let Some(entry) = table.get_mut(&outcome.node_id) else { continue };
            if entry.generation() != outcome.generation {
                continue;
            }
            if let Some(transition) = entry.health_mut().record_probe(outcome.ok, k, now) {
                log_transition(&outcome.node_id, transition);
            }
        }
        if let Some(grace) = self.settings.eviction_grace() {
            for node_id in table.expired(grace, now) {
                table.deregister(&node_id);
                warn!("Node {node_id} evicted after being unreachable for {grace}");
            }
        }
    }

    /// Polls health every configured interval until `cancel` fires. A sweep
    /// in flight at cancellation is abandoned.
    pub async fn run_health_loop(self: Arc<Self>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.settings.health_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Health monitoring started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            tokio::select! {
                () = cancel.cancelled() => break,
                () = self.poll_health() => {}
            }
        }
        info!("Health monitoring stopped");
    }

    /// Routes `event` to every subscriber except its source. Unreachable
    /// subscribers are skipped; everything else gets a single attempt.
    pub async fn publish(&self, event: &Event) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        if self.shut_down.load(Ordering::Acquire) {
            warn!("Dropping event {} published after shutdown", event.id());
            return report;
        }
        let mut targets = Vec::new();
        for entry in self.nodes.read().await.subscribers(event.event_type(), event.source()) {
            let node_id = entry.descriptor().node_id().to_string();
            if entry.state() == HealthState::Unreachable {
                debug!("Skipping unreachable node {node_id} for {}", event.event_type());
                report.skipped.push(node_id);
            } else {
                targets.push((entry.descriptor().clone(), entry.generation()));
            }
        }

        let outcomes =
            deliver_all(&self.transport, targets, event, self.settings.delivery_timeout()).await;

        let now = Utc::now();
        {
            let mut table = self.nodes.write().await;
            for outcome in &outcomes {
                let Some(entry) = table.get_mut(&outcome.node_id) else { continue };
                if entry.generation() != outcome.generation {
                    continue;
                }
                let burst = self.settings.delivery_burst_limit;
                if let Some(transition) = entry.health_mut().record_delivery(outcome.ok, burst, now) {
                    log_transition(&outcome.node_id, transition);
                }
            }
        }
        for outcome in outcomes {
            if outcome.ok {
                report.delivered.push(outcome.node_id);
            } else {
                report.failed.push(outcome.node_id);
            }
        }
        debug!(
            "Routed {} from {}: {} delivered, {} skipped, {} failed",
            event.event_type(),
            event.source(),
            report.delivered.len(),
            report.skipped.len(),
            report.failed.len()
        );
        self.events.lock().await.record(event, &report);
        report
    }

    pub async fn summary(&self) -> OverallHealth {
        let table = self.nodes.read().await;
        if table.is_empty() {
            return OverallHealth::Healthy;
        }
        if table.iter().all(|e| e.state() != HealthState::Healthy) {
            return OverallHealth::Critical;
        }
        if table.iter().any(|e| e.descriptor().is_required() && e.state() != HealthState::Healthy) {
            return OverallHealth::Degraded;
        }
        OverallHealth::Healthy
    }

    pub async fn history(&self) -> Vec<EventRecord> { self.events.lock().await.history() }

    pub async fn stats(&self) -> EventStats { self.events.lock().await.stats() }

    /// Status document served at `/status`.
    pub async fn status_document(&self) -> serde_json::Value {
        let nodes = self.nodes().await;
        let by_state = nodes.iter().map(|n| n.health.state().to_string()).counts();
        let overall = self.summary().await;
        let events = self.stats().await;
        json!({
            "service": self.settings.name,
            "status": overall,
            "started_at": self.started_at,
            "uptime_seconds": (Utc::now() - self.started_at).num_seconds(),
            "nodes_by_state": by_state,
            "services": nodes,
            "events": events,
        })
    }

    /// Drops every registration and refuses further publishes.
    pub async fn teardown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut table = self.nodes.write().await;
        info!("Tearing down node table with {} node(s)", table.len());
        table.clear();
    }
}

fn log_transition(node_id: &str, (from, to): Transition) {
    match to {
        HealthState::Healthy => info!("Node {node_id} is healthy (was {from})"),
        HealthState::Degraded | HealthState::Unreachable | HealthState::Unknown => {
            warn!("Node {node_id} is {to} (was {from})");
        }
    }
}

#[async_trait]
impl NodeComponent for Orchestrator {
    fn name(&self) -> &str { &self.settings.name }

    fn probe(&self) -> ProbeStatus {
        if self.shut_down.load(Ordering::Acquire) { ProbeStatus::NotReady } else { ProbeStatus::Ready }
    }

    async fn handle_event(&self, event: Event) -> Result<(), NodeError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(NodeError::NotReady);
        }
        self.publish(&event).await;
        Ok(())
    }

    async fn status(&self) -> serde_json::Value { self.status_document().await }
}

#[async_trait]
impl EventOutlet for Orchestrator {
    async fn forward(&self, event: Event) -> Result<DeliveryReport, ResponseError> {
        Ok(self.publish(&event).await)
    }
}

use super::{NodeDescriptor, NodeTransport};
use crate::http_handler::{DeliveryReport, Event, EventType};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::{sync::Arc, time::Duration};
use tracing::debug;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone)]
pub(super) struct DeliveryOutcome {
    pub(super) node_id: String,
    pub(super) generation: u64,
    pub(super) ok: bool,
}

/// Delivers `event` to every target concurrently, one bounded attempt each.
pub(super) async fn deliver_all(
    transport: &Arc<dyn NodeTransport>,
    targets: Vec<(NodeDescriptor, u64)>,
    event: &Event,
    timeout: Duration,
) -> Vec<DeliveryOutcome> {
    let attempts = targets.into_iter().map(|(node, generation)| async move {
        let ok = match tokio::time::timeout(timeout, transport.deliver(&node, event)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!("Delivery of {} to {} failed: {e}", event.id(), node.node_id());
                false
            }
            Err(_) => {
                debug!("Delivery of {} to {} timed out", event.id(), node.node_id());
                false
            }
        };
        DeliveryOutcome { node_id: node.node_id().to_string(), generation, ok }
    });
    join_all(attempts).await
}

/// Entry of the bounded publish history.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EventRecord {
    pub id: uuid::Uuid,
    pub event_type: EventType,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Publish totals since start.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct EventStats {
    pub total: u64,
    pub by_type: BTreeMap<EventType, u64>,
    pub by_source: BTreeMap<String, u64>,
    /// Breakdown of the retained history only.
    pub recent_by_type: HashMap<EventType, usize>,
}

/// Bounded history of published events plus running totals.
#[derive(Debug)]
pub(super) struct EventLog {
    history: VecDeque<EventRecord>,
    limit: usize,
    total: u64,
    by_type: BTreeMap<EventType, u64>,
    by_source: BTreeMap<String, u64>,
}

impl EventLog {
    pub(super) fn new(limit: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(limit),
            limit,
            total: 0,
            by_type: BTreeMap::new(),
            by_source: BTreeMap::new(),
        }
    }

    pub(super) fn record(&mut self, event: &Event, report: &DeliveryReport) {
        self.total += 1;
        *self.by_type.entry(event.event_type()).or_default() += 1;
        *self.by_source.entry(event.source().to_string()).or_default() += 1;
        if self.limit == 0 {
            return;
        }
        if self.history.len() == self.limit {
            self.history.pop_front();
        }
        self.history.push_back(EventRecord {
            id: event.id(),
            event_type: event.event_type(),
            source: event.source().to_string(),
            timestamp: event.timestamp(),
            delivered: report.delivered.len(),
            skipped: report.skipped.len(),
            failed: report.failed.len(),
        });
    }

    /// Retained records, oldest first.
    pub(super) fn history(&self) -> Vec<EventRecord> { self.history.iter().cloned().collect() }

    pub(super) fn stats(&self) -> EventStats {
        EventStats {
            total: self.total,
            by_type: self.by_type.clone(),
            by_source: self.by_source.clone(),
            recent_by_type: self.history.iter().map(|r| r.event_type).counts(),
        }
    }
}

use super::node::{HealthState, NodeDescriptor, NodeHealth};
use crate::http_handler::EventType;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A registered node together with its observed health.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    descriptor: NodeDescriptor,
    health: NodeHealth,
    registered_at: DateTime<Utc>,
    /// Bumped on every (re-)registration; stale probe results are dropped.
    generation: u64,
}

impl NodeEntry {
    pub fn descriptor(&self) -> &NodeDescriptor { &self.descriptor }
    pub fn health(&self) -> &NodeHealth { &self.health }
    pub fn health_mut(&mut self) -> &mut NodeHealth { &mut self.health }
    pub fn state(&self) -> HealthState { self.health.state() }
    pub fn registered_at(&self) -> DateTime<Utc> { self.registered_at }
    pub fn generation(&self) -> u64 { self.generation }
}

/// Registered nodes keyed by id.
#[derive(Debug, Default)]
pub struct NodeTable {
    nodes: BTreeMap<String, NodeEntry>,
    next_generation: u64,
}

impl NodeTable {
    /// Inserts or replaces `descriptor`. Re-registering a known id starts it
    /// over as a fresh instance. Returns whether an entry was replaced.
    pub fn register(&mut self, descriptor: NodeDescriptor, now: DateTime<Utc>) -> bool {
        self.next_generation += 1;
        let entry = NodeEntry {
            descriptor,
            health: NodeHealth::default(),
            registered_at: now,
            generation: self.next_generation,
        };
        self.nodes.insert(entry.descriptor.node_id().to_string(), entry).is_some()
    }

    /// Removes `node_id`; removing an unknown id is not an error.
    pub fn deregister(&mut self, node_id: &str) -> bool { self.nodes.remove(node_id).is_some() }

    pub fn get(&self, node_id: &str) -> Option<&NodeEntry> { self.nodes.get(node_id) }

    pub fn get_mut(&mut self, node_id: &str) -> Option<&mut NodeEntry> { self.nodes.get_mut(node_id) }

    pub fn iter(&self) -> impl Iterator<Item = &NodeEntry> { self.nodes.values() }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn clear(&mut self) { self.nodes.clear(); }

    /// Entries accepting `event_type`, excluding the publishing node itself.
    pub fn subscribers(&self, event_type: EventType, source: &str) -> Vec<&NodeEntry> {
        self.nodes
            .values()
            .filter(|e| e.descriptor.accepts(event_type) && e.descriptor.node_id() != source)
            .collect()
    }

    /// Ids of unreachable nodes whose grace period ran out at `now`.
    pub fn expired(&self, grace: chrono::TimeDelta, now: DateTime<Utc>) -> Vec<String> {
        self.nodes
            .values()
            .filter(|e| e.health.unreachable_since().is_some_and(|since| now - since >= grace))
            .map(|e| e.descriptor.node_id().to_string())
            .collect()
    }
}

//! Service orchestration: node registration, health polling and event
//! routing with graceful degradation.

mod coordinator;
mod event_router;
mod health_monitor;
mod node;
mod node_table;
mod routes;
mod transport;


pub use coordinator::{NodeView, Orchestrator, OverallHealth};
pub use event_router::{EventRecord, EventStats};
pub use node::{HealthState, NodeDescriptor, NodeHealth, Transition};
pub use node_table::{NodeEntry, NodeTable};
pub use routes::orchestrator_routes;
pub use transport::{HttpTransport, NodeTransport, TransportError};

//! Node-to-node HTTP plumbing: the client side used by the orchestrator and
//! the self-registering nodes, and the server side every node exposes.

mod event;
mod health;
pub(crate) mod http_client;
pub(crate) mod http_request;
pub mod http_response;
mod node_server;
mod registration;


pub use event::{Event, EventType, PhaseChange};
pub use health::ProbeStatus;
pub use http_response::{
    delivery_report::DeliveryReport, event_ack::EventAck, probe_report::ProbeReport,
    registration_ack::RegistrationAck, response_common::ResponseError,
};
pub use node_server::{NodeComponent, NodeError, node_routes, serve};
pub use registration::register_with_orchestrator;

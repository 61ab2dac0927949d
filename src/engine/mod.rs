//! The commentary tick loop and the hand-off of its events.

mod commentary_engine;
mod event_publisher;

#[cfg(test)]
mod tests;

pub use commentary_engine::{CommentaryEngine, EngineNode, EngineStatus};
pub use event_publisher::{EventOutlet, EventPublisher, RemoteOutlet, run_forwarder};

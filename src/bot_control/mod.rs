//! Bot-platform sink node.

mod bot_node;
mod event_sink;
mod flight_context;
mod persona;

#[cfg(test)]
mod tests;

pub use bot_node::BotControl;
pub use event_sink::{EventSink, LogSink, SinkError, SinkMessage};
pub use flight_context::{Alertness, FlightContext};
pub use persona::{Persona, persona, personas};

use crate::commentary::Utterance;
use crate::flight_control::{FlightPhase, FlightSnapshot};
use chrono::{DateTime, Utc};
use serde_json::json;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Event types exchanged between nodes. Nodes subscribe by declaring the
/// types they accept.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum EventType {
    #[strum(serialize = "simviator.flight.phase_changed")]
    #[serde(rename = "simviator.flight.phase_changed")]
    PhaseChanged,
    #[strum(serialize = "simviator.commentary.generated")]
    #[serde(rename = "simviator.commentary.generated")]
    CommentaryGenerated,
    #[strum(serialize = "simviator.emergency.declared")]
    #[serde(rename = "simviator.emergency.declared")]
    EmergencyDeclared,
    #[strum(serialize = "bot_control.personality.changed")]
    #[serde(rename = "bot_control.personality.changed")]
    PersonalityChanged,
    #[strum(serialize = "bot_control.command.received")]
    #[serde(rename = "bot_control.command.received")]
    CommandReceived,
}

/// Payload of a [`EventType::PhaseChanged`] event.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PhaseChange {
    pub from: FlightPhase,
    pub to: FlightPhase,
    pub snapshot: FlightSnapshot,
}

/// Envelope of everything routed by the orchestrator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Event {
    id: Uuid,
    #[serde(rename = "type")]
    event_type: EventType,
    source: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    data: serde_json::Value,
}

impl Event {
    pub fn new(event_type: EventType, source: &str, data: serde_json::Value) -> Self {
        Self { id: Uuid::new_v4(), event_type, source: source.to_string(), timestamp: Utc::now(), data }
    }

    pub fn commentary(source: &str, utterance: &Utterance) -> Self {
        let mut event = Self::new(EventType::CommentaryGenerated, source, json!(utterance));
        event.timestamp = utterance.timestamp();
        event
    }

    pub fn phase_changed(source: &str, change: PhaseChange) -> Self {
        let mut event = Self::new(EventType::PhaseChanged, source, json!(change));
        event.timestamp = change.snapshot.timestamp();
        event
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn event_type(&self) -> EventType { self.event_type }
    pub fn source(&self) -> &str { &self.source }
    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }
    pub fn data(&self) -> &serde_json::Value { &self.data }

    /// Decodes the payload into its typed form.
    pub fn decode<T>(&self) -> Result<T, serde_json::Error>
    where T: for<'de> serde::Deserialize<'de> {
        T::deserialize(&self.data)
    }
}

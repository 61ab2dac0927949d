use crate::flight_control::FlightPhase;
use chrono::{DateTime, Utc};

/// One rendered line of commentary. Forwarded once as an event, never stored.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Utterance {
    character_id: String,
    character_name: String,
    rendered_text: String,
    phase: FlightPhase,
    timestamp: DateTime<Utc>,
}

impl Utterance {
    pub fn new(
        character_id: &str,
        character_name: &str,
        rendered_text: String,
        phase: FlightPhase,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            character_id: character_id.to_string(),
            character_name: character_name.to_string(),
            rendered_text,
            phase,
            timestamp,
        }
    }

    pub fn character_id(&self) -> &str { &self.character_id }
    pub fn character_name(&self) -> &str { &self.character_name }
    pub fn rendered_text(&self) -> &str { &self.rendered_text }
    pub fn phase(&self) -> FlightPhase { self.phase }
    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }
}

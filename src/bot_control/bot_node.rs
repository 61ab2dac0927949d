use super::event_sink::{EventSink, SinkMessage};
use super::flight_context::FlightContext;
use super::persona::{Persona, persona, personas};
use crate::commentary::Utterance;
use crate::http_handler::{Event, EventType, NodeComponent, NodeError, PhaseChange, ProbeStatus};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug)]
struct BotState {
    persona: &'static Persona,
    context: FlightContext,
    relayed: u64,
    failed_sends: u64,
    last_message: Option<SinkMessage>,
}

/// Bot-platform sink node: relays commentary to the registered platforms and
/// keeps track of the flight for their chat replies.
pub struct BotControl {
    name: String,
    sinks: Vec<Arc<dyn EventSink>>,
    state: RwLock<BotState>,
}

impl BotControl {
    /// Starts with `default_persona`, falling back to the first known persona
    /// when that id is unknown.
    pub fn new(name: &str, default_persona: &str, sinks: Vec<Arc<dyn EventSink>>) -> Self {
        let start = persona(default_persona).unwrap_or_else(|| {
            warn!("Unknown persona {default_persona}, using {}", personas()[0].id);
            &personas()[0]
        });
        Self {
            name: name.to_string(),
            sinks,
            state: RwLock::new(BotState {
                persona: start,
                context: FlightContext::default(),
                relayed: 0,
                failed_sends: 0,
                last_message: None,
            }),
        }
    }

    pub async fn persona(&self) -> &'static Persona { self.state.read().await.persona }

    pub async fn context(&self) -> FlightContext { self.state.read().await.context.clone() }

    pub async fn set_persona(&self, id: &str) -> Result<(), NodeError> {
        let next = persona(id).ok_or_else(|| NodeError::Rejected(format!("unknown persona {id}")))?;
        let mut state = self.state.write().await;
        info!("Persona changed: {} -> {}", state.persona.id, next.id);
        state.persona = next;
        Ok(())
    }

    /// Sends `message` to every platform at once; failures are counted, not
    /// returned.
    async fn relay(&self, speaker: &str, text: &str, urgent: bool) {
        let message = {
            let state = self.state.read().await;
            SinkMessage {
                speaker: speaker.to_string(),
                text: text.to_string(),
                persona: state.persona.id.to_string(),
                urgent,
            }
        };
        let results = join_all(self.sinks.iter().map(|sink| sink.send(&message))).await;
        let mut failed = 0;
        for (sink, result) in self.sinks.iter().zip(results) {
            if let Err(e) = result {
                warn!("Relay to {} failed: {e}", sink.platform());
                failed += 1;
            }
        }
        let mut state = self.state.write().await;
        state.relayed += 1;
        state.failed_sends += failed;
        state.last_message = Some(message);
    }

    fn decode<T>(event: &Event) -> Result<T, NodeError>
    where T: for<'de> serde::Deserialize<'de> {
        event.decode().map_err(|e| NodeError::Rejected(format!("malformed {} payload: {e}", event.event_type())))
    }
}

#[async_trait]
impl NodeComponent for BotControl {
    fn name(&self) -> &str { &self.name }

    fn probe(&self) -> ProbeStatus {
        if self.sinks.is_empty() { ProbeStatus::NotReady } else { ProbeStatus::Ready }
    }

    async fn handle_event(&self, event: Event) -> Result<(), NodeError> {
        match event.event_type() {
            EventType::CommentaryGenerated => {
                let line: Utterance = Self::decode(&event)?;
                self.state.write().await.context.enter_phase(line.phase(), None, line.timestamp());
                self.relay(line.character_name(), line.rendered_text(), false).await;
            }
            EventType::PhaseChanged => {
                let change: PhaseChange = Self::decode(&event)?;
                let altitude = change.snapshot.altitude();
                self.state.write().await.context.enter_phase(change.to, altitude, event.timestamp());
            }
            EventType::EmergencyDeclared => {
                self.state.write().await.context.declare_emergency(event.timestamp());
                let text = event
                    .data()
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("Emergency declared")
                    .to_string();
                self.relay(event.source(), &text, true).await;
            }
            EventType::PersonalityChanged => {
                let id = event
                    .data()
                    .get("personality")
                    .and_then(serde_json::Value::as_str)
                    .ok_or_else(|| NodeError::Rejected("missing personality".to_string()))?;
                self.set_persona(id).await?;
            }
            other @ EventType::CommandReceived => return Err(NodeError::Unsupported(other)),
        }
        Ok(())
    }

    async fn status(&self) -> serde_json::Value {
        let state = self.state.read().await;
        json!({
            "service": self.name,
            "status": if self.sinks.is_empty() { "no_platforms" } else { "running" },
            "platforms": self.sinks.iter().map(|s| s.platform()).collect::<Vec<_>>(),
            "personality": state.persona,
            "flight_context": state.context,
            "relayed": state.relayed,
            "failed_sends": state.failed_sends,
            "last_message": state.last_message,
        })
    }
}

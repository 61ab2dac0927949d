use super::*;
use crate::commentary::Utterance;
use crate::flight_control::{FlightPhase, FlightSnapshot};
use crate::http_handler::{Event, EventType, NodeComponent, NodeError, PhaseChange, ProbeStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn t0() -> DateTime<Utc> { DateTime::from_timestamp(1_700_000_000, 0).unwrap() }

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<SinkMessage>>,
}

#[async_trait]
impl EventSink for RecordingSink {
    fn platform(&self) -> &str { "recorder" }

    async fn send(&self, message: &SinkMessage) -> Result<(), SinkError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

struct BrokenSink;

#[async_trait]
impl EventSink for BrokenSink {
    fn platform(&self) -> &str { "broken" }

    async fn send(&self, _message: &SinkMessage) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("broken".to_string()))
    }
}

fn bot_with(sink: &Arc<RecordingSink>) -> BotControl {
    BotControl::new("bot_control", "friendly_helper", vec![sink.clone() as Arc<dyn EventSink>])
}

fn commentary_event(text: &str, phase: FlightPhase) -> Event {
    let line = Utterance::new("dublin_control", "Dublin Control", text.to_string(), phase, t0());
    Event::commentary("engine", &line)
}

#[test]
fn test_persona_lookup() {
    assert_eq!(personas().len(), 5);
    assert_eq!(persona("captain_murphy").unwrap().name, "Captain Murphy");
    assert!(persona("nobody").is_none());
}

#[test]
fn test_unknown_default_persona_falls_back() {
    let bot = BotControl::new("bot", "nobody", Vec::new());
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    assert_eq!(rt.block_on(bot.persona()).id, "friendly_helper");
}

#[test]
fn test_readiness_requires_a_platform() {
    assert_eq!(BotControl::new("bot", "friendly_helper", Vec::new()).probe(), ProbeStatus::NotReady);
    let sink = Arc::new(RecordingSink::default());
    assert_eq!(bot_with(&sink).probe(), ProbeStatus::Ready);
}

#[tokio::test]
async fn test_commentary_is_relayed_with_persona() {
    let sink = Arc::new(RecordingSink::default());
    let bot = bot_with(&sink);
    bot.handle_event(commentary_event("EI123, taxi as cleared.", FlightPhase::Taxi)).await.unwrap();

    let sent = sink.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].speaker, "Dublin Control");
    assert_eq!(sent[0].text, "EI123, taxi as cleared.");
    assert_eq!(sent[0].persona, "friendly_helper");
    assert!(!sent[0].urgent);

    let status = bot.status().await;
    assert_eq!(status["relayed"], 1);
    assert_eq!(status["failed_sends"], 0);
}

#[tokio::test]
async fn test_failing_platform_does_not_fail_the_event() {
    let sink = Arc::new(RecordingSink::default());
    let bot = BotControl::new(
        "bot",
        "friendly_helper",
        vec![Arc::new(BrokenSink) as Arc<dyn EventSink>, sink.clone() as Arc<dyn EventSink>],
    );
    bot.handle_event(commentary_event("hello", FlightPhase::Cruise)).await.unwrap();
    assert_eq!(sink.sent.lock().unwrap().len(), 1);
    assert_eq!(bot.status().await["failed_sends"], 1);
}

#[tokio::test]
async fn test_phase_changes_drive_alertness() {
    let sink = Arc::new(RecordingSink::default());
    let bot = bot_with(&sink);
    let snapshot = FlightSnapshot::at(t0()).with_altitude(150.0);
    let change = PhaseChange { from: FlightPhase::Taxi, to: FlightPhase::Takeoff, snapshot };
    bot.handle_event(Event::phase_changed("engine", change)).await.unwrap();

    let context = bot.context().await;
    assert_eq!(context.phase, Some(FlightPhase::Takeoff));
    assert_eq!(context.altitude, Some(150.0));
    assert_eq!(context.alertness, Alertness::High);
    assert!(context.technical_focus);

    let cruise = FlightSnapshot::at(t0()).with_altitude(35_000.0);
    let change = PhaseChange { from: FlightPhase::Climb, to: FlightPhase::Cruise, snapshot: cruise };
    bot.handle_event(Event::phase_changed("engine", change)).await.unwrap();
    let context = bot.context().await;
    assert_eq!(context.alertness, Alertness::Normal);
    assert!(!context.technical_focus);
    assert!(sink.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_emergency_stays_high_through_cruise() {
    let sink = Arc::new(RecordingSink::default());
    let bot = bot_with(&sink);
    let emergency = Event::new(EventType::EmergencyDeclared, "engine", json!({ "message": "Mayday" }));
    bot.handle_event(emergency).await.unwrap();

    let sent = sink.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].urgent);
    assert_eq!(sent[0].text, "Mayday");

    let change = PhaseChange { from: FlightPhase::Climb, to: FlightPhase::Cruise, snapshot: FlightSnapshot::at(t0()) };
    bot.handle_event(Event::phase_changed("engine", change)).await.unwrap();
    let context = bot.context().await;
    assert!(context.emergency);
    assert_eq!(context.alertness, Alertness::High);
}

#[tokio::test]
async fn test_personality_change() {
    let sink = Arc::new(RecordingSink::default());
    let bot = bot_with(&sink);
    let change = Event::new(EventType::PersonalityChanged, "ui", json!({ "personality": "captain_murphy" }));
    bot.handle_event(change).await.unwrap();
    assert_eq!(bot.persona().await.id, "captain_murphy");

    let unknown = Event::new(EventType::PersonalityChanged, "ui", json!({ "personality": "nobody" }));
    assert!(matches!(bot.handle_event(unknown).await, Err(NodeError::Rejected(_))));
    let missing = Event::new(EventType::PersonalityChanged, "ui", json!({}));
    assert!(matches!(bot.handle_event(missing).await, Err(NodeError::Rejected(_))));
    assert_eq!(bot.persona().await.id, "captain_murphy");
}

#[tokio::test]
async fn test_malformed_and_unsupported_events() {
    let sink = Arc::new(RecordingSink::default());
    let bot = bot_with(&sink);
    let malformed = Event::new(EventType::CommentaryGenerated, "engine", json!({ "text": 1 }));
    assert!(matches!(bot.handle_event(malformed).await, Err(NodeError::Rejected(_))));
    let command = Event::new(EventType::CommandReceived, "ui", json!({}));
    assert!(matches!(
        bot.handle_event(command).await,
        Err(NodeError::Unsupported(EventType::CommandReceived))
    ));
}

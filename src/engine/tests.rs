use super::*;
use crate::commentary::{
    CharacterRegistry, CommentarySelector, CooldownPolicy, LikelihoodDraw, default_cast,
};
use crate::flight_control::{FlightPhase, FlightSnapshot, PhaseClassifier, SnapshotSlot, SnapshotWriter};
use crate::http_handler::{
    DeliveryReport, Event, EventType, NodeComponent, NodeError, PhaseChange, ProbeStatus,
    ResponseError,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Every Bernoulli trial succeeds.
struct AlwaysSpeak;

impl LikelihoodDraw for AlwaysSpeak {
    fn draw(&mut self) -> f64 { 0.0 }
}

/// No Bernoulli trial succeeds.
struct NeverSpeak;

impl LikelihoodDraw for NeverSpeak {
    fn draw(&mut self) -> f64 { 1.0 }
}

fn t0() -> DateTime<Utc> { DateTime::from_timestamp(1_700_000_000, 0).unwrap() }

fn engine(
    cooldown: CooldownPolicy,
    capacity: usize,
) -> (CommentaryEngine, SnapshotWriter, mpsc::Receiver<Event>) {
    engine_with(cooldown, capacity, Box::new(AlwaysSpeak))
}

fn engine_with(
    cooldown: CooldownPolicy,
    capacity: usize,
    draw: Box<dyn LikelihoodDraw>,
) -> (CommentaryEngine, SnapshotWriter, mpsc::Receiver<Event>) {
    let registry = Arc::new(CharacterRegistry::load(default_cast()).unwrap());
    let selector = CommentarySelector::new(registry, cooldown, "EI123", draw);
    let (writer, reader) = SnapshotSlot::channel();
    let (publisher, rx) = EventPublisher::channel(capacity);
    let engine = CommentaryEngine::new("simviator", reader, PhaseClassifier::default(), selector, publisher);
    (engine, writer, rx)
}

fn short_cooldowns() -> CooldownPolicy {
    CooldownPolicy { base_window_secs: 1.0, per_level_factor: 1.0, global_gap_secs: 3.0 }
}

/// Taxi, takeoff and climb-out, then level cruise; one sample per second.
fn departure() -> Vec<FlightSnapshot> {
    let at = |i: usize| FlightSnapshot::at(t0() + TimeDelta::seconds(i64::try_from(i).unwrap()));
    let mut samples = Vec::new();
    for i in 0..20 {
        samples.push(
            at(samples.len())
                .with_on_ground(true)
                .with_ground_speed(5.0 + (i % 11) as f64)
                .with_vertical_speed(0.0)
                .with_altitude(200.0)
                .with_heading(270.0)
                .with_gear_position(1.0),
        );
    }
    for i in 0..30 {
        samples.push(
            at(samples.len())
                .with_on_ground(false)
                .with_ground_speed(150.0)
                .with_airspeed(160.0)
                .with_vertical_speed(1500.0)
                .with_altitude(300.0 + 100.0 * i as f64)
                .with_gear_position(1.0),
        );
    }
    for _ in 0..40 {
        samples.push(
            at(samples.len())
                .with_on_ground(false)
                .with_ground_speed(420.0)
                .with_airspeed(250.0)
                .with_vertical_speed(0.0)
                .with_altitude(5_000.0)
                .with_gear_position(0.0),
        );
    }
    samples
}

#[test]
fn test_departure_yields_phases_and_commentary() {
    let (mut engine, writer, mut rx) = engine(short_cooldowns(), 1024);
    let mut spoken_in = Vec::new();
    for snapshot in departure() {
        writer.publish(snapshot);
        if let Some(line) = engine.step(snapshot.timestamp()) {
            spoken_in.push(line.phase());
        }
    }
    assert_eq!(engine.phase(), FlightPhase::Cruise);
    assert!(spoken_in.contains(&FlightPhase::Taxi));
    assert!(spoken_in.contains(&FlightPhase::Cruise));

    let mut phases = Vec::new();
    let mut commentary = 0;
    while let Ok(event) = rx.try_recv() {
        match event.event_type() {
            EventType::PhaseChanged => phases.push(event.decode::<PhaseChange>().unwrap().to),
            EventType::CommentaryGenerated => commentary += 1,
            other => panic!("unexpected {other}"),
        }
    }
    assert_eq!(
        phases,
        vec![FlightPhase::Taxi, FlightPhase::Takeoff, FlightPhase::Climb, FlightPhase::Cruise]
    );
    assert_eq!(commentary, spoken_in.len());
}

#[test]
fn test_stale_snapshot_is_classified_once() {
    let (mut engine, writer, _rx) = engine(CooldownPolicy::default(), 16);
    assert!(engine.step(t0()).is_none());
    let taxiing = FlightSnapshot::at(t0()).with_on_ground(true).with_ground_speed(10.0);
    writer.publish(taxiing);
    for s in 0..10 {
        engine.step(t0() + TimeDelta::seconds(s));
    }
    assert_eq!(engine.phase(), FlightPhase::Preflight);
}

#[tokio::test]
async fn test_full_queue_drops_instead_of_blocking() {
    let (mut engine, writer, _rx) = engine(
        CooldownPolicy { base_window_secs: 0.0, per_level_factor: 1.0, global_gap_secs: 0.0 },
        1,
    );
    writer.publish(FlightSnapshot::at(t0()).with_on_ground(true));
    for s in 0..5 {
        assert!(engine.step(t0() + TimeDelta::seconds(s)).is_some());
    }
    let status = engine.node().status().await;
    assert_eq!(status["engine"]["utterances"], 5);
    assert_eq!(status["engine"]["dropped_events"], 4);
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_reports_readiness() {
    let (engine, writer, _rx) = engine(CooldownPolicy::default(), 16);
    let node = engine.node();
    assert_eq!(node.probe(), ProbeStatus::NotReady);
    writer.publish(FlightSnapshot::at(Utc::now()).with_on_ground(true).with_ground_speed(0.0));

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(engine.run(Duration::from_millis(500), cancel.clone()));
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(node.probe(), ProbeStatus::Ready);
    let status = node.status().await;
    assert_eq!(status["engine"]["phase"], "preflight");
    assert!(status["engine"]["ticks"].as_u64().unwrap() >= 4);

    cancel.cancel();
    handle.await.unwrap();
    assert_eq!(node.probe(), ProbeStatus::NotReady);
}

fn emergency() -> Event { Event::new(EventType::EmergencyDeclared, "bot_control", serde_json::json!({})) }

#[tokio::test]
async fn test_emergency_is_answered_without_the_draw() {
    let (mut engine, writer, mut rx) = engine_with(short_cooldowns(), 16, Box::new(NeverSpeak));
    let node = engine.node();
    writer.publish(FlightSnapshot::at(t0()).with_on_ground(true));
    assert!(engine.step(t0()).is_none());

    node.handle_event(emergency()).await.unwrap();
    let line = engine.step(t0() + TimeDelta::seconds(1)).unwrap();
    assert_eq!(line.character_id(), "captain_murphy");
    assert_eq!(line.rendered_text(), "EI123, stay calm. Run your emergency checklist first.");
    assert!(engine.step(t0() + TimeDelta::seconds(2)).is_none());

    let mut commentary = 0;
    while let Ok(event) = rx.try_recv() {
        if event.event_type() == EventType::CommentaryGenerated {
            commentary += 1;
        }
    }
    assert_eq!(commentary, 1);
    let status = node.status().await;
    assert_eq!(status["engine"]["emergencies"], 1);
    assert_eq!(status["engine"]["utterances"], 1);
}

#[tokio::test]
async fn test_emergency_ignores_global_gap_but_not_cooldowns() {
    let (mut engine, writer, _rx) = engine(short_cooldowns(), 16);
    let node = engine.node();
    writer.publish(FlightSnapshot::at(t0()).with_on_ground(true));
    let routine = engine.step(t0()).unwrap();

    node.handle_event(emergency()).await.unwrap();
    let first = engine.step(t0() + TimeDelta::seconds(1)).unwrap();
    let expected = if routine.character_id() == "captain_murphy" { "dublin_control" } else { "captain_murphy" };
    assert_eq!(first.character_id(), expected);

    node.handle_event(emergency()).await.unwrap();
    let second = engine.step(t0() + TimeDelta::seconds(1)).unwrap();
    assert_ne!(second.character_id(), first.character_id());
    assert_ne!(second.character_id(), routine.character_id());
}

#[tokio::test]
async fn test_engine_accepts_only_emergencies() {
    let (engine, _writer, _rx) = engine(CooldownPolicy::default(), 16);
    let node = engine.node();
    let commentary = Event::new(EventType::CommentaryGenerated, "elsewhere", serde_json::json!({}));
    assert!(matches!(
        node.handle_event(commentary).await,
        Err(NodeError::Unsupported(EventType::CommentaryGenerated))
    ));
    for _ in 0..8 {
        node.handle_event(emergency()).await.unwrap();
    }
    assert!(matches!(node.handle_event(emergency()).await, Err(NodeError::NotReady)));
}

#[derive(Default)]
struct RecordingOutlet {
    seen: Mutex<Vec<EventType>>,
}

#[async_trait]
impl EventOutlet for RecordingOutlet {
    async fn forward(&self, event: Event) -> Result<DeliveryReport, ResponseError> {
        self.seen.lock().unwrap().push(event.event_type());
        if event.event_type() == EventType::EmergencyDeclared {
            return Err(ResponseError::NoConnection);
        }
        Ok(DeliveryReport::default())
    }
}

#[tokio::test]
async fn test_forwarder_survives_outlet_errors() {
    let (publisher, rx) = EventPublisher::channel(8);
    let outlet = Arc::new(RecordingOutlet::default());
    let cancel = CancellationToken::new();
    let forwarder =
        tokio::spawn(run_forwarder(rx, Arc::clone(&outlet) as Arc<dyn EventOutlet>, cancel.clone()));

    for event_type in [EventType::EmergencyDeclared, EventType::CommentaryGenerated] {
        assert!(publisher.publish(Event::new(event_type, "simviator", serde_json::json!({}))));
    }
    drop(publisher);
    forwarder.await.unwrap();
    assert_eq!(
        *outlet.seen.lock().unwrap(),
        vec![EventType::EmergencyDeclared, EventType::CommentaryGenerated]
    );
}

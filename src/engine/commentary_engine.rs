use super::EventPublisher;
use crate::commentary::{CharacterStatus, CommentarySelector, Utterance};
use crate::flight_control::{FlightPhase, FlightSnapshot, PhaseClassifier, SnapshotReader};
use crate::http_handler::{Event, EventType, NodeComponent, NodeError, PhaseChange, ProbeStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Declared emergencies waiting for the next tick.
const EMERGENCY_QUEUE: usize = 8;

/// Engine state published after every tick.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct EngineStatus {
    pub phase: FlightPhase,
    pub ticks: u64,
    pub utterances: u64,
    pub snapshot: Option<FlightSnapshot>,
    pub last_utterance: Option<Utterance>,
    pub characters: Vec<CharacterStatus>,
    pub dropped_events: u64,
    pub emergencies: u64,
}

/// Classifies the latest snapshot and asks the selector for a line, once per
/// tick.
///
/// The engine owns the classifier and the selector outright; nothing else
/// touches the cooldown map.
pub struct CommentaryEngine {
    name: String,
    reader: SnapshotReader,
    classifier: PhaseClassifier,
    selector: CommentarySelector,
    publisher: EventPublisher,
    phase: FlightPhase,
    last_seen: Option<DateTime<Utc>>,
    status: EngineStatus,
    status_tx: watch::Sender<EngineStatus>,
    running: Arc<AtomicBool>,
    emergency_tx: mpsc::Sender<Event>,
    emergency_rx: mpsc::Receiver<Event>,
}

impl CommentaryEngine {
    pub fn new(
        name: &str,
        reader: SnapshotReader,
        classifier: PhaseClassifier,
        selector: CommentarySelector,
        publisher: EventPublisher,
    ) -> Self {
        let status = EngineStatus { characters: selector.character_status(), ..EngineStatus::default() };
        let (status_tx, _) = watch::channel(status.clone());
        let (emergency_tx, emergency_rx) = mpsc::channel(EMERGENCY_QUEUE);
        Self {
            name: name.to_string(),
            reader,
            classifier,
            selector,
            publisher,
            phase: FlightPhase::default(),
            last_seen: None,
            status,
            status_tx,
            running: Arc::new(AtomicBool::new(false)),
            emergency_tx,
            emergency_rx,
        }
    }

    pub fn phase(&self) -> FlightPhase { self.phase }

    /// Node facade exposing this engine's health and status.
    pub fn node(&self) -> EngineNode {
        EngineNode {
            name: self.name.clone(),
            characters: self.selector.registry().len(),
            running: Arc::clone(&self.running),
            status: self.status_tx.subscribe(),
            emergencies: self.emergency_tx.clone(),
        }
    }

    /// One selection cycle at `now`. Only a snapshot not seen before advances
    /// the classifier; selection always runs on the latest snapshot.
    ///
    /// A pending emergency takes the tick: it is answered before, and instead
    /// of, routine selection.
    pub fn step(&mut self, now: DateTime<Utc>) -> Option<Utterance> {
        self.status.ticks += 1;
        if let Ok(emergency) = self.emergency_rx.try_recv() {
            return self.answer_emergency(&emergency, now);
        }
        let snapshot = self.reader.latest()?;
        if self.last_seen != Some(snapshot.timestamp()) {
            self.last_seen = Some(snapshot.timestamp());
            let next = self.classifier.classify(self.phase, &snapshot);
            if next != self.phase {
                info!("Flight phase {} -> {next}", self.phase);
                let change = PhaseChange { from: self.phase, to: next, snapshot };
                self.publisher.publish(Event::phase_changed(&self.name, change));
                self.phase = next;
            }
        }

        let utterance = self.selector.select(self.phase, &snapshot, now);
        self.status.snapshot = Some(snapshot);
        self.emit(utterance)
    }

    fn answer_emergency(&mut self, emergency: &Event, now: DateTime<Utc>) -> Option<Utterance> {
        warn!("Emergency declared by {} in {}", emergency.source(), self.phase);
        self.status.emergencies += 1;
        let snapshot = self.reader.latest().unwrap_or_else(|| FlightSnapshot::at(now));
        let utterance = self.selector.respond_to_emergency(self.phase, &snapshot, now);
        if utterance.is_none() {
            warn!("No character available to answer the emergency");
        }
        self.emit(utterance)
    }

    /// Publishes `utterance`, if any, and refreshes the published status.
    fn emit(&mut self, utterance: Option<Utterance>) -> Option<Utterance> {
        if let Some(line) = &utterance {
            info!("[{}] {}", line.character_name(), line.rendered_text());
            self.publisher.publish(Event::commentary(&self.name, line));
            self.status.utterances += 1;
            self.status.last_utterance = Some(line.clone());
            self.status.characters = self.selector.character_status();
        }
        self.status.phase = self.phase;
        self.status.dropped_events = self.publisher.dropped();
        self.status_tx.send_replace(self.status.clone());
        utterance
    }

    /// Ticks every `tick` until `cancel` fires. Late ticks are skipped
    /// rather than bunched up.
    pub async fn run(mut self, tick: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.running.store(true, Ordering::Release);
        info!("Commentary engine running at {:.1} Hz", 1.0 / tick.as_secs_f64());
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if self.step(Utc::now()).is_none() {
                        debug!("Nothing to say in {}", self.phase);
                    }
                }
            }
        }
        self.running.store(false, Ordering::Release);
        info!("Commentary engine stopped in {}", self.phase);
    }
}

/// [`NodeComponent`] view of a [`CommentaryEngine`].
#[derive(Debug, Clone)]
pub struct EngineNode {
    name: String,
    characters: usize,
    running: Arc<AtomicBool>,
    status: watch::Receiver<EngineStatus>,
    emergencies: mpsc::Sender<Event>,
}

#[async_trait]
impl NodeComponent for EngineNode {
    fn name(&self) -> &str { &self.name }

    fn probe(&self) -> ProbeStatus {
        if self.characters > 0 && self.running.load(Ordering::Acquire) {
            ProbeStatus::Ready
        } else {
            ProbeStatus::NotReady
        }
    }

    /// Only declared emergencies are accepted; they are queued for the tick
    /// loop, which owns the selector.
    async fn handle_event(&self, event: Event) -> Result<(), NodeError> {
        if event.event_type() != EventType::EmergencyDeclared {
            return Err(NodeError::Unsupported(event.event_type()));
        }
        self.emergencies.try_send(event).map_err(|_| NodeError::NotReady)
    }

    async fn status(&self) -> serde_json::Value {
        let status = self.status.borrow().clone();
        json!({
            "service": self.name,
            "status": if self.probe().is_ready() { "running" } else { "stopped" },
            "engine": status,
        })
    }
}

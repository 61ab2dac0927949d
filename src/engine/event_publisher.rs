use crate::http_handler::{
    DeliveryReport, Event, ResponseError,
    http_client::HTTPClient,
    http_request::{publish_post::PublishRequest, request_common::JSONBodyHTTPRequestType},
};
use async_trait::async_trait;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Destination of the events leaving the engine.
#[async_trait]
pub trait EventOutlet: Send + Sync + 'static {
    async fn forward(&self, event: Event) -> Result<DeliveryReport, ResponseError>;
}

/// Hands events from the tick loop to the forwarder without ever waiting.
///
/// When the queue is full the event is dropped and counted; commentary is
/// only worth anything while it is current.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<Event>,
    dropped: Arc<AtomicU64>,
}

impl EventPublisher {
    pub fn channel(capacity: usize) -> (EventPublisher, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (EventPublisher { tx, dropped: Arc::new(AtomicU64::new(0)) }, rx)
    }

    /// Queues `event`; returns whether it was accepted.
    pub fn publish(&self, event: Event) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Event queue full, dropping {} {}", event.event_type(), event.id());
                false
            }
            Err(TrySendError::Closed(event)) => {
                debug!("Event forwarder gone, dropping {}", event.id());
                false
            }
        }
    }

    pub fn dropped(&self) -> u64 { self.dropped.load(Ordering::Relaxed) }
}

/// Drains the publisher queue into `outlet` until `cancel` fires or every
/// publisher is gone. Each event gets exactly one attempt.
pub async fn run_forwarder(
    mut rx: mpsc::Receiver<Event>,
    outlet: Arc<dyn EventOutlet>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        let (id, event_type) = (event.id(), event.event_type());
        match outlet.forward(event).await {
            Ok(report) => debug!(
                "Forwarded {event_type} {id}: {} delivered, {} skipped, {} failed",
                report.delivered.len(),
                report.skipped.len(),
                report.failed.len()
            ),
            Err(e) => warn!("Could not forward {event_type} {id}: {e}"),
        }
    }
    info!("Event forwarder stopped");
}

/// [`EventOutlet`] publishing through a remote orchestrator's HTTP API.
#[derive(Debug)]
pub struct RemoteOutlet {
    client: HTTPClient,
}

impl RemoteOutlet {
    pub fn new(orchestrator_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self { client: HTTPClient::new(orchestrator_url, timeout)? })
    }
}

#[async_trait]
impl EventOutlet for RemoteOutlet {
    async fn forward(&self, event: Event) -> Result<DeliveryReport, ResponseError> {
        PublishRequest { event }.send_request(&self.client).await
    }
}

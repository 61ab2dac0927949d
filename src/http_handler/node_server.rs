use super::http_response::{event_ack::EventAck, probe_report::ProbeReport};
use super::{Event, EventType, ProbeStatus};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Reasons a node refuses an incoming event.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("event type {0} is not handled by this node")]
    Unsupported(EventType),
    #[error("node is not ready")]
    NotReady,
    #[error("event rejected: {0}")]
    Rejected(String),
}

impl NodeError {
    fn status_code(&self) -> StatusCode {
        match self {
            NodeError::Unsupported(_) => StatusCode::UNPROCESSABLE_ENTITY,
            NodeError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            NodeError::Rejected(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// A component run as an independently reachable service node.
#[async_trait]
pub trait NodeComponent: Send + Sync + 'static {
    /// Service name reported in health answers.
    fn name(&self) -> &str;

    /// Readiness of the component's internal dependencies. Must be cheap and
    /// must not change any state.
    fn probe(&self) -> ProbeStatus;

    async fn handle_event(&self, event: Event) -> Result<(), NodeError>;

    /// Free-form status document served at `/status`.
    async fn status(&self) -> serde_json::Value;
}

#[derive(Clone)]
struct NodeState {
    component: Arc<dyn NodeComponent>,
    probe_timeout: Duration,
}

impl NodeState {
    /// Runs the readiness probe off the async workers, bounded by the probe
    /// timeout. A probe that does not answer in time counts as not ready.
    async fn timed_probe(&self) -> ProbeStatus {
        let component = Arc::clone(&self.component);
        let probe = tokio::task::spawn_blocking(move || component.probe());
        match tokio::time::timeout(self.probe_timeout, probe).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!("Readiness probe of {} failed: {e}", self.component.name());
                ProbeStatus::NotReady
            }
            Err(_) => {
                warn!("Readiness probe of {} timed out", self.component.name());
                ProbeStatus::NotReady
            }
        }
    }

    fn report(&self, status: ProbeStatus) -> ProbeReport {
        ProbeReport { status, service: self.component.name().to_string() }
    }
}

/// Health, status and event endpoints shared by every node.
pub fn node_routes(component: Arc<dyn NodeComponent>, probe_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
        .route("/status", get(status))
        .route("/events", post(receive_event))
        .with_state(NodeState { component, probe_timeout })
}

async fn health(State(state): State<NodeState>) -> (StatusCode, Json<serde_json::Value>) {
    let service = state.component.name().to_string();
    if state.timed_probe().await.is_ready() {
        (StatusCode::OK, Json(json!({ "status": "healthy", "service": service })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unhealthy", "service": service })))
    }
}

async fn live(State(state): State<NodeState>) -> Json<ProbeReport> {
    Json(state.report(ProbeStatus::Alive))
}

async fn ready(State(state): State<NodeState>) -> (StatusCode, Json<ProbeReport>) {
    let status = state.timed_probe().await;
    let code = if status.is_ready() { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(state.report(status)))
}

async fn status(State(state): State<NodeState>) -> Json<serde_json::Value> {
    Json(state.component.status().await)
}

async fn receive_event(
    State(state): State<NodeState>,
    Json(event): Json<Event>,
) -> (StatusCode, Json<EventAck>) {
    let event_id = event.id();
    debug!("{} received {} from {}", state.component.name(), event.event_type(), event.source());
    match state.component.handle_event(event).await {
        Ok(()) => (StatusCode::OK, Json(EventAck { accepted: true, event_id })),
        Err(e) => {
            warn!("{} refused event {event_id}: {e}", state.component.name());
            (e.status_code(), Json(EventAck { accepted: false, event_id }))
        }
    }
}

/// Serves `router` on `bind` until `cancel` fires, then drains in-flight
/// requests.
pub async fn serve(router: Router, bind: &str, cancel: CancellationToken) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router.layer(TraceLayer::new_for_http()))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
}

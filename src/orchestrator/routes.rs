use super::coordinator::NodeView;
use super::event_router::EventRecord;
use super::{NodeDescriptor, Orchestrator};
use crate::http_handler::{DeliveryReport, Event, NodeComponent, RegistrationAck, node_routes};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use std::{sync::Arc, time::Duration};

type OrchestratorArc = Arc<Orchestrator>;

/// Node endpoints plus registration, routing and history endpoints.
pub fn orchestrator_routes(orchestrator: OrchestratorArc, probe_timeout: Duration) -> Router {
    let own = Router::new()
        .route("/nodes", post(register).get(list_nodes))
        .route("/nodes/:id", delete(deregister))
        .route("/publish", post(publish))
        .route("/events/history", get(history))
        .with_state(Arc::clone(&orchestrator));
    node_routes(orchestrator as Arc<dyn NodeComponent>, probe_timeout).merge(own)
}

async fn register(
    State(orchestrator): State<OrchestratorArc>,
    Json(descriptor): Json<NodeDescriptor>,
) -> Result<Json<RegistrationAck>, (StatusCode, String)> {
    if descriptor.node_id().trim().is_empty() || descriptor.base_url().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "node_id and base_url are required".to_string()));
    }
    let node_id = descriptor.node_id().to_string();
    let replaced = orchestrator.register(descriptor).await;
    Ok(Json(RegistrationAck { node_id, replaced }))
}

async fn deregister(State(orchestrator): State<OrchestratorArc>, Path(id): Path<String>) -> StatusCode {
    if orchestrator.deregister(&id).await { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}

async fn list_nodes(State(orchestrator): State<OrchestratorArc>) -> Json<Vec<NodeView>> {
    Json(orchestrator.nodes().await)
}

async fn publish(
    State(orchestrator): State<OrchestratorArc>,
    Json(event): Json<Event>,
) -> Json<DeliveryReport> {
    Json(orchestrator.publish(&event).await)
}

async fn history(State(orchestrator): State<OrchestratorArc>) -> Json<Vec<EventRecord>> {
    Json(orchestrator.history().await)
}

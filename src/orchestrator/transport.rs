use super::NodeDescriptor;
use crate::http_handler::{
    Event, ProbeStatus, ResponseError,
    http_client::HTTPClient,
    http_request::{
        event_post::EventPostRequest,
        readiness_get::ReadinessRequest,
        request_common::{JSONBodyHTTPRequestType, NoBodyHTTPRequestType},
    },
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::{collections::HashMap, time::Duration};
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error("cannot build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("node {0} refused the event")]
    Refused(String),
}

/// How the orchestrator talks to its nodes.
#[async_trait]
pub trait NodeTransport: Send + Sync + 'static {
    /// Asks `node` for its readiness.
    async fn probe(&self, node: &NodeDescriptor) -> Result<ProbeStatus, TransportError>;

    /// Delivers `event` to `node`, once.
    async fn deliver(&self, node: &NodeDescriptor, event: &Event) -> Result<(), TransportError>;
}

/// [`NodeTransport`] over the nodes' HTTP endpoints.
#[derive(Debug)]
pub struct HttpTransport {
    timeout: Duration,
    clients: RwLock<HashMap<String, HTTPClient>>,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self { Self { timeout, clients: RwLock::new(HashMap::new()) } }

    async fn client_for(&self, node: &NodeDescriptor) -> Result<HTTPClient, TransportError> {
        if let Some(client) = self.clients.read().await.get(node.base_url()) {
            return Ok(client.clone());
        }
        let client = HTTPClient::new(node.base_url(), self.timeout)?;
        self.clients.write().await.insert(node.base_url().to_string(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl NodeTransport for HttpTransport {
    async fn probe(&self, node: &NodeDescriptor) -> Result<ProbeStatus, TransportError> {
        let client = self.client_for(node).await?;
        match (ReadinessRequest {}).send_request(&client).await {
            Ok(report) => Ok(report.status),
            Err(ResponseError::Status(StatusCode::SERVICE_UNAVAILABLE)) => Ok(ProbeStatus::NotReady),
            Err(e) => Err(e.into()),
        }
    }

    async fn deliver(&self, node: &NodeDescriptor, event: &Event) -> Result<(), TransportError> {
        let client = self.client_for(node).await?;
        let ack = EventPostRequest { event }.send_request(&client).await?;
        if ack.accepted { Ok(()) } else { Err(TransportError::Refused(node.node_id().to_string())) }
    }
}

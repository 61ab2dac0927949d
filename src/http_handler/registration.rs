use super::http_client::HTTPClient;
use super::http_request::{register_post::RegisterNodeRequest, request_common::JSONBodyHTTPRequestType};
use super::{RegistrationAck, ResponseError};
use crate::orchestrator::NodeDescriptor;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const FIRST_RETRY: Duration = Duration::from_secs(1);
const MAX_RETRY: Duration = Duration::from_secs(10);

/// Announces `descriptor` to the orchestrator at `orchestrator_url`, retrying
/// with doubling delays for at most `attempts` tries.
///
/// Returns `Ok(None)` when cancelled before an answer arrived.
pub async fn register_with_orchestrator(
    orchestrator_url: &str,
    descriptor: NodeDescriptor,
    attempts: u32,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Option<RegistrationAck>, ResponseError> {
    let client = HTTPClient::new(orchestrator_url, timeout)?;
    let request = RegisterNodeRequest { descriptor };
    let mut delay = FIRST_RETRY;
    let mut attempt = 1;
    loop {
        match request.send_request(&client).await {
            Ok(ack) => {
                info!("Registered {} with orchestrator at {}", ack.node_id, client.url());
                return Ok(Some(ack));
            }
            Err(e) if attempt < attempts => {
                warn!("Registration attempt {attempt}/{attempts} failed: {e}, retrying in {delay:?}");
            }
            Err(e) => return Err(e),
        }
        tokio::select! {
            () = cancel.cancelled() => return Ok(None),
            () = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
        delay = (delay * 2).min(MAX_RETRY);
    }
}

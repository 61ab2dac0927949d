use super::response_common::SerdeJSONBodyHTTPResponseType;
use uuid::Uuid;

/// Response of a node's `POST /events` endpoint.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventAck {
    pub accepted: bool,
    pub event_id: Uuid,
}

impl SerdeJSONBodyHTTPResponseType for EventAck {}

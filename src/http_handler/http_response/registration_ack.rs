use super::response_common::SerdeJSONBodyHTTPResponseType;

/// Response of the orchestrator's `POST /nodes` endpoint.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegistrationAck {
    pub node_id: String,
    /// `true` when the id was already known and its counters were reset.
    pub replaced: bool,
}

impl SerdeJSONBodyHTTPResponseType for RegistrationAck {}

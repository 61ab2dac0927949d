use super::response_common::SerdeJSONBodyHTTPResponseType;
use crate::http_handler::ProbeStatus;

/// Body of the `/health/live` and `/health/ready` endpoints.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Outcome of the probe.
    pub status: ProbeStatus,
    /// Name of the answering node.
    pub service: String,
}

impl SerdeJSONBodyHTTPResponseType for ProbeReport {}

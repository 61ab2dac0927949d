use super::request_common::{HTTPRequestMethod, HTTPRequestType, NoBodyHTTPRequestType};
use crate::http_handler::http_response::probe_report::ProbeReport;

/// Request type for a node's /health/ready endpoint.
#[derive(Debug)]
pub(crate) struct ReadinessRequest {}

impl NoBodyHTTPRequestType for ReadinessRequest {}

impl HTTPRequestType for ReadinessRequest {
    type Response = ProbeReport;
    fn endpoint(&self) -> &'static str { "/health/ready" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
}

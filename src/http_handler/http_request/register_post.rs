use super::request_common::{HTTPRequestMethod, HTTPRequestType, JSONBodyHTTPRequestType};
use crate::http_handler::http_response::registration_ack::RegistrationAck;
use crate::orchestrator::NodeDescriptor;

/// Registers the calling node with the orchestrator.
#[derive(Debug)]
pub(crate) struct RegisterNodeRequest {
    pub(crate) descriptor: NodeDescriptor,
}

impl JSONBodyHTTPRequestType for RegisterNodeRequest {
    type Body = NodeDescriptor;
    fn body(&self) -> &Self::Body { &self.descriptor }
}

impl HTTPRequestType for RegisterNodeRequest {
    type Response = RegistrationAck;
    fn endpoint(&self) -> &'static str { "/nodes" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}

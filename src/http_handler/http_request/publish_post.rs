use super::request_common::{HTTPRequestMethod, HTTPRequestType, JSONBodyHTTPRequestType};
use crate::http_handler::{Event, http_response::delivery_report::DeliveryReport};

/// Hands an event to the orchestrator for routing.
#[derive(Debug)]
pub(crate) struct PublishRequest {
    pub(crate) event: Event,
}

impl JSONBodyHTTPRequestType for PublishRequest {
    type Body = Event;
    fn body(&self) -> &Self::Body { &self.event }
}

impl HTTPRequestType for PublishRequest {
    type Response = DeliveryReport;
    fn endpoint(&self) -> &'static str { "/publish" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}

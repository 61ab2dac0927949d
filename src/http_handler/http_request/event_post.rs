use super::request_common::{HTTPRequestMethod, HTTPRequestType, JSONBodyHTTPRequestType};
use crate::http_handler::{Event, http_response::event_ack::EventAck};

/// Delivers one event to a subscribed node's /events endpoint.
#[derive(Debug)]
pub(crate) struct EventPostRequest<'a> {
    pub(crate) event: &'a Event,
}

impl JSONBodyHTTPRequestType for EventPostRequest<'_> {
    type Body = Event;
    fn body(&self) -> &Self::Body { self.event }
}

impl HTTPRequestType for EventPostRequest<'_> {
    type Response = EventAck;
    fn endpoint(&self) -> &'static str { "/events" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}

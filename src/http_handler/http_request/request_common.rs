use crate::http_handler::http_client::HTTPClient;
use crate::http_handler::http_response::response_common::{HTTPResponseType, ResponseError};

/// HTTP methods used between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub(crate) enum HTTPRequestMethod {
    Get,
    Post,
}

/// Parsed response type of a request.
pub(crate) type ParsedResponse<T> =
    <<T as HTTPRequestType>::Response as HTTPResponseType>::ParsedResponseType;

pub(crate) trait HTTPRequestType {
    /// Type of the expected response.
    type Response: HTTPResponseType;
    /// Path of the endpoint, relative to the peer's base URL.
    fn endpoint(&self) -> &str;
    fn request_method(&self) -> HTTPRequestMethod;
    fn header_params(&self) -> reqwest::header::HeaderMap { reqwest::header::HeaderMap::default() }

    fn compose(&self, client: &HTTPClient) -> reqwest::RequestBuilder {
        let url = format!("{}{}", client.url(), self.endpoint());
        let builder = match self.request_method() {
            HTTPRequestMethod::Get => client.client().get(url),
            HTTPRequestMethod::Post => client.client().post(url),
        };
        builder.headers(self.header_params())
    }
}

pub(crate) trait NoBodyHTTPRequestType: HTTPRequestType {
    async fn send_request(&self, client: &HTTPClient) -> Result<ParsedResponse<Self>, ResponseError>
    where Self: Sized {
        let response = self.compose(client).send().await?;
        <Self::Response as HTTPResponseType>::read_response(response).await
    }
}

pub(crate) trait JSONBodyHTTPRequestType: HTTPRequestType {
    /// The type of the json body.
    type Body: serde::Serialize + Sync;
    /// Returns the serializable object.
    fn body(&self) -> &Self::Body;

    async fn send_request(&self, client: &HTTPClient) -> Result<ParsedResponse<Self>, ResponseError>
    where Self: Sized {
        let response = self.compose(client).json(self.body()).send().await?;
        <Self::Response as HTTPResponseType>::read_response(response).await
    }
}

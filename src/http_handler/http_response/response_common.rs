use reqwest::StatusCode;

/// Failure of a request/response exchange with another node.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    /// The peer answered, but not with a success code.
    #[error("peer answered with status {0}")]
    Status(StatusCode),
    #[error("peer is not reachable")]
    NoConnection,
    #[error("peer did not answer in time")]
    Timeout,
    #[error("malformed response body: {0}")]
    Body(String),
    #[error("request failed: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for ResponseError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            ResponseError::Timeout
        } else if value.is_connect() {
            ResponseError::NoConnection
        } else if value.is_decode() || value.is_body() {
            ResponseError::Body(value.to_string())
        } else if let Some(status) = value.status() {
            ResponseError::Status(status)
        } else {
            ResponseError::Unknown(value.to_string())
        }
    }
}

pub(crate) trait HTTPResponseType {
    type ParsedResponseType;
    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError>;

    fn unwrap_return_code(response: reqwest::Response) -> Result<reqwest::Response, ResponseError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ResponseError::Status(response.status()))
        }
    }
}

/// Marker for responses whose body is a plain serde JSON document.
pub(crate) trait SerdeJSONBodyHTTPResponseType {}

impl<T> HTTPResponseType for T
where
    T: SerdeJSONBodyHTTPResponseType,
    for<'de> T: serde::Deserialize<'de>,
{
    type ParsedResponseType = T;

    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError> {
        let resp = Self::unwrap_return_code(response)?;
        Ok(resp.json::<T>().await?)
    }
}

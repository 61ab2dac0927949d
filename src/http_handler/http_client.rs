use std::time::Duration;

/// A thin wrapper around `reqwest::Client` bound to one peer node.
///
/// Every request made through it carries the configured timeout, so no call
/// to another node can block for longer than that.
#[derive(Debug, Clone)]
pub(crate) struct HTTPClient {
    /// The underlying `reqwest::Client` used to perform HTTP requests.
    client: reqwest::Client,
    /// Base URL of the peer, prepended to all endpoint paths.
    base_url: String,
}

impl HTTPClient {
    /// Constructs a new `HTTPClient` for the node reachable at `base_url`.
    ///
    /// # Arguments
    /// * `base_url` – Root URL of the peer (e.g. `"http://localhost:8001"`).
    /// * `timeout` – Upper bound for a whole request/response exchange.
    pub(crate) fn new(base_url: &str, timeout: Duration) -> Result<HTTPClient, reqwest::Error> {
        Ok(HTTPClient {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns a reference to the internal `reqwest::Client`.
    pub(super) fn client(&self) -> &reqwest::Client { &self.client }
    /// Returns the base URL that the client was initialized with.
    pub(crate) fn url(&self) -> &str { self.base_url.as_str() }
}

//! The transport seam: anything that can turn a signed request into a
//! response. Swappable so `rpcforge-testkit` can substitute a scripted
//! transport in tests without touching the rest of the orchestrator.

use async_trait::async_trait;
use bytes::Bytes;

/// Failure sending or receiving over the wire.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP client reported an I/O failure.
    #[error("transport I/O error: {0}")]
    Io(String),
    /// The connection was reset before any response bytes arrived.
    #[error("connection reset before any bytes were received")]
    ResetBeforeBytes,
}

/// Sends a signed [`http::Request`] and returns the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and await its response.
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, TransportError>;
}

/// The default [`Transport`], backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from an already-configured `reqwest::Client`.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, TransportError> {
        let (parts, body) = request.into_parts();
        let mut builder = self.client.request(parts.method, parts.uri.to_string());
        for (name, value) in parts.headers.iter() {
            builder = builder.header(name, value);
        }
        let reqwest_request = builder.body(body).build().map_err(|e| TransportError::Io(e.to_string()))?;

        let response = self.client.execute(reqwest_request).await.map_err(|e| {
            if e.is_connect() {
                TransportError::ResetBeforeBytes
            } else {
                TransportError::Io(e.to_string())
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| TransportError::Io(e.to_string()))?;

        let mut builder = http::Response::builder().status(status);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        builder.body(bytes).map_err(|e| TransportError::Io(e.to_string()))
    }
}

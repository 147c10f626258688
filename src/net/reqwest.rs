//! [`Transport`] backed by a `reqwest` client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::error::{Error, Result};

use super::{HttpRequest, HttpResponse, Method, Transport};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// HTTP transport over `reqwest`.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        trace!(url = %request.url, status, bytes = body.len(), "Exchange complete");
        Ok(HttpResponse::new(status, body))
    }
}

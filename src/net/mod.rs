//! Network collaborator and requester.
//!
//! The raw exchange is delegated to a [`Transport`]; the requester builds
//! requests from commands and forms, checks the status and parses the body.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `requester` | Request preparation and exchange handling |
//! | `reqwest` | [`ReqwestTransport`] (feature `reqwest`) |

// ============================================================================
// Submodules
// ============================================================================

/// Request preparation and exchange handling.
pub mod requester;

/// HTTP transport backed by reqwest.
#[cfg(feature = "reqwest")]
pub mod reqwest;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Re-exports
// ============================================================================

pub use requester::{Exchange, RequestSpec, parse_structured};

#[cfg(feature = "reqwest")]
pub use self::reqwest::ReqwestTransport;

// ============================================================================
// Method
// ============================================================================

/// HTTP method of a command request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Returns the method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(Error::invalid_argument(format!(
                "unsupported method: {other}"
            ))),
        }
    }
}

// ============================================================================
// HttpRequest / HttpResponse
// ============================================================================

/// A request handed to the [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,

    /// Target URL, already joined against the configured base.
    pub url: String,

    /// Request headers, in insertion order.
    pub headers: Vec<(String, String)>,

    /// JSON body, if any.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Returns the first header named `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response returned by the [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,

    /// Raw body text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Performs raw HTTP exchanges.
///
/// Implementations return `Ok` for any response that carries a status,
/// including error statuses; `Err` is reserved for exchanges that failed
/// before a status was received.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the status and raw body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

// ============================================================================
// Tests
// ============================================================================

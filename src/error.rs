//! Error types for sxkit.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use sxkit::{Result, SwapMethod};
//!
//! async fn example(sx: &sxkit::Sx) -> Result<()> {
//!     sx.select("#list")
//!         .get("/items")
//!         .swap("beforeend".parse::<SwapMethod>()?)
//!         .settled()
//!         .await
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`] |
//! | Resolution | [`Error::ElementNotFound`], [`Error::NotAForm`] |
//! | Parse | [`Error::Parse`] |
//! | Transport | [`Error::Transport`], [`Error::Network`] |
//! | Chain | [`Error::ChainClosed`] |
//!
//! Soft validation failures while filling a form are not errors; they are
//! reported as [`FillWarning`](crate::form::FillWarning)s.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Errors are `Clone` so a chain outcome can be handed to every waiter
/// that settles on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the runtime context is built with missing or invalid
    /// settings.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument at a call boundary.
    ///
    /// Returned for unknown swap methods, unknown effects, malformed
    /// intervals and unparseable URLs.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// No node matches the selector.
    #[error("Element not found: selector={selector}")]
    ElementNotFound {
        /// Selector used for the lookup.
        selector: String,
    },

    /// The node matched by the selector is not a form.
    #[error("Element is not a form: selector={selector}")]
    NotAForm {
        /// Selector used for the lookup.
        selector: String,
    },

    // ========================================================================
    // Parse Errors
    // ========================================================================
    /// Response text is not a well-formed keyed value.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Server answered with a non-success status.
    #[error("HTTP error {status} from {url}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The exchange failed before a status was received.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network failure.
        message: String,
    },

    // ========================================================================
    // Chain Errors
    // ========================================================================
    /// The chain worker stopped before the step settled.
    #[error("Command chain closed")]
    ChainClosed,
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Creates a not-a-form error.
    #[inline]
    pub fn not_a_form(selector: impl Into<String>) -> Self {
        Self::NotAForm {
            selector: selector.into(),
        }
    }

    /// Creates a parse error.
    #[inline]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a transport (status) error.
    #[inline]
    pub fn transport(status: u16, url: impl Into<String>) -> Self {
        Self::Transport {
            status,
            url: url.into(),
        }
    }

    /// Creates a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if a target or form node could not be resolved.
    #[inline]
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. } | Self::NotAForm { .. })
    }

    /// Returns `true` if the exchange itself failed.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Network { .. })
    }

    /// Returns `true` if this is a parse error.
    #[inline]
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Returns the HTTP status carried by a transport error.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::invalid_argument(format!("invalid URL: {err}"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::transport(404, "/items");
        assert_eq!(err.to_string(), "HTTP error 404 from /items");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("document is required");
        assert_eq!(err.to_string(), "Configuration error: document is required");
    }

    #[test]
    fn test_is_resolution_error() {
        assert!(Error::element_not_found("#missing").is_resolution_error());
        assert!(Error::not_a_form("#div").is_resolution_error());
        assert!(!Error::network("reset").is_resolution_error());
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::transport(500, "/x").is_transport_error());
        assert!(Error::network("refused").is_transport_error());
        assert!(!Error::parse("bad").is_transport_error());
    }

    #[test]
    fn test_status() {
        assert_eq!(Error::transport(503, "/x").status(), Some(503));
        assert_eq!(Error::ChainClosed.status(), None);
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}

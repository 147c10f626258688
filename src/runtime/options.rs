//! Runtime configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use sxkit::{FailurePolicy, SxOptions};
//!
//! let options = SxOptions::new()
//!     .with_default_effect_duration(Duration::from_millis(300))
//!     .with_csrf_header("X-XSRF-TOKEN")
//!     .with_failure_policy(FailurePolicy::Recover);
//!
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// Effect duration when none is given.
pub const DEFAULT_EFFECT_DURATION: Duration = Duration::from_millis(200);

/// Form field holding the CSRF token.
pub const DEFAULT_CSRF_FIELD: &str = "_csrf";

/// Header the CSRF token is sent in.
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRF-TOKEN";

// ============================================================================
// FailurePolicy
// ============================================================================

/// What a chain does after a failed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Skip the remaining fill/swap/effect steps and settle with the error.
    #[default]
    Propagate,

    /// Keep running the chain with no response available.
    Recover,
}

// ============================================================================
// SxOptions
// ============================================================================

/// Settings shared by every command of a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SxOptions {
    /// Duration of effects that are given none.
    pub default_effect_duration: Duration,

    /// Form field whose value is sent as the CSRF token.
    pub csrf_field: String,

    /// Header the CSRF token is sent in.
    pub csrf_header: String,

    /// Behavior after a failed request.
    pub failure_policy: FailurePolicy,

    /// Base that relative request URLs are joined against.
    pub base_url: Option<Url>,
}

impl Default for SxOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SxOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_effect_duration: DEFAULT_EFFECT_DURATION,
            csrf_field: DEFAULT_CSRF_FIELD.to_string(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            failure_policy: FailurePolicy::Propagate,
            base_url: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SxOptions {
    /// Sets the default effect duration.
    #[inline]
    #[must_use]
    pub fn with_default_effect_duration(mut self, duration: Duration) -> Self {
        self.default_effect_duration = duration;
        self
    }

    /// Sets the CSRF form field name.
    #[inline]
    #[must_use]
    pub fn with_csrf_field(mut self, field: impl Into<String>) -> Self {
        self.csrf_field = field.into();
        self
    }

    /// Sets the CSRF header name.
    #[inline]
    #[must_use]
    pub fn with_csrf_header(mut self, header: impl Into<String>) -> Self {
        self.csrf_header = header.into();
        self
    }

    /// Sets the failure policy.
    #[inline]
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the base URL.
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base_url = Some(base);
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SxOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.csrf_field.is_empty() {
            return Err("CSRF field name must not be empty".to_string());
        }

        if self.csrf_header.is_empty() || !self.csrf_header.bytes().all(is_header_char) {
            return Err(format!("Invalid CSRF header name: {:?}", self.csrf_header));
        }

        if let Some(base) = &self.base_url
            && base.cannot_be_a_base()
        {
            return Err(format!("Base URL cannot be a base: {base}"));
        }

        Ok(())
    }
}

/// RFC 7230 token character.
fn is_header_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte)
}

// ============================================================================
// Tests
// ============================================================================

//! Builder pattern for context configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sxkit::{MemoryDocument, Sx, SxOptions};
//!
//! let sx = Sx::builder()
//!     .document(Arc::new(MemoryDocument::new()))
//!     .transport(transport)
//!     .options(SxOptions::new().with_csrf_field("token"))
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::net::Transport;
use crate::timer::{Timers, TokioTimers};

use super::core::Sx;
use super::options::SxOptions;

// ============================================================================
// SxBuilder
// ============================================================================

/// Builder for an [`Sx`] context.
///
/// Use [`Sx::builder()`] to create one.
#[derive(Default, Clone)]
pub struct SxBuilder {
    /// Document collaborator.
    document: Option<Arc<dyn Document>>,
    /// Transport collaborator.
    transport: Option<Arc<dyn Transport>>,
    /// Timer source; Tokio when unset.
    timers: Option<Arc<dyn Timers>>,
    /// Settings.
    options: SxOptions,
}

impl fmt::Debug for SxBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SxBuilder")
            .field("document", &self.document.is_some())
            .field("transport", &self.transport.is_some())
            .field("timers", &self.timers.is_some())
            .field("options", &self.options)
            .finish()
    }
}

// ============================================================================
// SxBuilder Implementation
// ============================================================================

impl SxBuilder {
    /// Creates a builder with no collaborators and default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document. Required.
    #[inline]
    #[must_use]
    pub fn document(mut self, document: Arc<dyn Document>) -> Self {
        self.document = Some(document);
        self
    }

    /// Sets the transport. Required.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the timer source.
    #[inline]
    #[must_use]
    pub fn timers(mut self, timers: Arc<dyn Timers>) -> Self {
        self.timers = Some(timers);
        self
    }

    /// Sets the options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: SxOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the context with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the document or transport is not set
    /// - [`Error::Config`] if the options are invalid
    pub fn build(self) -> Result<Sx> {
        let document = self.validate_document()?;
        let transport = self.validate_transport()?;
        self.options.validate().map_err(Error::config)?;

        let timers = self
            .timers
            .unwrap_or_else(|| Arc::new(TokioTimers::new()) as Arc<dyn Timers>);

        Ok(Sx::new(document, transport, timers, self.options))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SxBuilder {
    fn validate_document(&self) -> Result<Arc<dyn Document>> {
        self.document.clone().ok_or_else(|| {
            Error::config(
                "Document is required. Use .document() to set it.\n\
                 Example: Sx::builder().document(Arc::new(MemoryDocument::new()))",
            )
        })
    }

    fn validate_transport(&self) -> Result<Arc<dyn Transport>> {
        self.transport.clone().ok_or_else(|| {
            Error::config(
                "Transport is required. Use .transport() to set it.\n\
                 Example: Sx::builder().transport(Arc::new(ReqwestTransport::new()?))",
            )
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

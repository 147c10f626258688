//! Core Sx context.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::command::Command;
use crate::dom::Document;
use crate::effect::EffectEngine;
use crate::net::Transport;
use crate::poll::PollRegistry;
use crate::timer::Timers;

use super::builder::SxBuilder;
use super::options::SxOptions;

// ============================================================================
// SxInner
// ============================================================================

/// Collaborators and shared state of a context.
pub(crate) struct SxInner {
    /// Document every command operates on.
    pub document: Arc<dyn Document>,
    /// HTTP exchange collaborator.
    pub transport: Arc<dyn Transport>,
    /// Timer source for polling and effect reverts.
    pub timers: Arc<dyn Timers>,
    /// Context settings.
    pub options: SxOptions,
    /// Keyed polls.
    pub registry: PollRegistry,
    /// Effect engine and pending reverts.
    pub effects: EffectEngine,
}

// ============================================================================
// Sx
// ============================================================================

/// Entry point: a document, a transport and the state commands share.
///
/// Cheap to clone; clones share the poll registry and pending effects.
///
/// # Example
///
/// ```ignore
/// use sxkit::{Sx, SwapMethod};
///
/// let sx = Sx::builder()
///     .document(document)
///     .transport(transport)
///     .build()?;
///
/// sx.select("#list")
///     .get("/items")
///     .swap(SwapMethod::BeforeEnd)
///     .poll("5s", Some("items"))
///     .settled()
///     .await?;
/// ```
#[derive(Clone)]
pub struct Sx {
    pub(crate) inner: Arc<SxInner>,
}

impl fmt::Debug for Sx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sx")
            .field("options", &self.inner.options)
            .field("polls", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

impl Sx {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SxBuilder {
        SxBuilder::new()
    }

    /// Creates a context from validated parts.
    pub(crate) fn new(
        document: Arc<dyn Document>,
        transport: Arc<dyn Transport>,
        timers: Arc<dyn Timers>,
        options: SxOptions,
    ) -> Self {
        let effects = EffectEngine::new(Arc::clone(&document), Arc::clone(&timers));
        Self {
            inner: Arc::new(SxInner {
                document,
                transport,
                timers,
                options,
                registry: PollRegistry::new(),
                effects,
            }),
        }
    }
}

// ============================================================================
// Sx - Accessors
// ============================================================================

impl Sx {
    /// Returns the context settings.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SxOptions {
        &self.inner.options
    }

    /// Returns the document.
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Arc<dyn Document> {
        &self.inner.document
    }

    /// Returns `true` while a poll is registered under `key`.
    #[must_use]
    pub fn is_polling(&self, key: &str) -> bool {
        self.inner.registry.is_active(key)
    }

    /// Number of keyed polls.
    #[must_use]
    pub fn active_polls(&self) -> usize {
        self.inner.registry.len()
    }

    /// Number of nodes with an effect revert still pending.
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.inner.effects.pending()
    }
}

// ============================================================================
// Sx - Operations
// ============================================================================

impl Sx {
    /// Starts a command on the first node matching `selector`.
    ///
    /// The node is resolved now. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn select(&self, selector: &str) -> Command {
        Command::new(Arc::clone(&self.inner), selector)
    }

    /// Stops the poll registered under `key`.
    ///
    /// Returns `true` if one was registered.
    pub fn stop(&self, key: &str) -> bool {
        self.inner.registry.stop(key)
    }

    /// Stops every poll and cancels every pending effect revert.
    ///
    /// Requests already in flight still complete.
    pub fn shutdown(&self) {
        let polls = self.inner.registry.clear();
        let reverts = self.inner.effects.pending();
        self.inner.effects.cancel_all();
        debug!(polls, reverts, "Context shut down");
    }
}

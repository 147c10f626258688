//! sxkit - Declarative fetch-and-swap orchestration for document trees.
//!
//! This library lets a caller declare, per target node, a chain of
//! operations: issue a request, fill a form from the response, swap the
//! response into the document, animate the result, update other nodes out
//! of band, and repeat the whole sequence on a timer.
//!
//! # Architecture
//!
//! The library never owns a document or an HTTP stack. It drives three
//! collaborators through traits:
//!
//! - **[`Document`]**: query and mutation primitives of a document tree
//! - **[`Transport`]**: raw HTTP exchanges
//! - **[`Timers`]**: repeating and one-shot callbacks
//!
//! Key design principles:
//!
//! - Requests start as soon as they are declared
//! - Fill, swap and effect steps run strictly in declaration order, each
//!   seeing the response of the request declared before it
//! - Every chain settles; failures surface through a handler or the log
//! - Polls are keyed per context, at most one live timer per key
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use sxkit::{Effect, MemoryDocument, ReqwestTransport, Result, SwapMethod, Sx};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let sx = Sx::builder()
//!         .document(Arc::new(MemoryDocument::new()))
//!         .transport(Arc::new(ReqwestTransport::new()?))
//!         .build()?;
//!
//!     sx.select("#list")
//!         .get("https://example.com/items")
//!         .swap(SwapMethod::BeforeEnd)
//!         .effect(Effect::FadeIn)
//!         .poll("5s", Some("items"))
//!         .settled()
//!         .await?;
//!
//!     sx.stop("items");
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`command`] | Chainable [`Command`] |
//! | [`runtime`] | [`Sx`] context, builder and options |
//! | [`dom`] | [`Document`] trait and [`MemoryDocument`] |
//! | [`form`] | Form serialization and filling |
//! | [`net`] | [`Transport`] trait and requester |
//! | [`swap`] | [`SwapMethod`] |
//! | [`effect`] | [`Effect`] and the effect engine |
//! | [`oob`] | Out-of-band updates |
//! | [`poll`] | Poll intervals and registry |
//! | [`timer`] | [`Timers`] trait and Tokio implementation |
//! | [`value`] | [`FormValue`] and [`Record`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//!
//! # Features
//!
//! - `reqwest`: [`ReqwestTransport`], an HTTP transport over `reqwest`

// ============================================================================
// Modules
// ============================================================================

/// Chainable commands.
///
/// Create them with [`Sx::select`].
pub mod command;

/// Document-tree collaborator.
pub mod dom;

/// Transition effects and pending reverts.
pub mod effect;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Form serialization and population.
pub mod form;

/// Type-safe identifiers.
pub mod identifiers;

/// Network collaborator and requester.
pub mod net;

/// Out-of-band updates.
pub mod oob;

/// Poll intervals and the keyed registry.
pub mod poll;

/// Runtime context and configuration.
///
/// Use [`Sx::builder()`] to create a context.
pub mod runtime;

/// Response swap strategies.
pub mod swap;

/// Timer collaborator.
pub mod timer;

/// Tagged values for form data and structured responses.
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Command types
pub use command::{Command, ErrorHandler};

// Runtime types
pub use runtime::{FailurePolicy, Sx, SxBuilder, SxOptions};

// Collaborators
pub use dom::{Document, MemoryDocument};
pub use net::{HttpRequest, HttpResponse, Method, Transport};
pub use timer::{TimerHandle, Timers, TokioTimers};

#[cfg(feature = "reqwest")]
pub use net::ReqwestTransport;

// Operation types
pub use effect::Effect;
pub use form::{FillReport, FillWarning};
pub use oob::OobConfig;
pub use poll::Interval;
pub use swap::SwapMethod;
pub use value::{FormValue, Record};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{NodeId, TimerId};

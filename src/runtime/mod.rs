//! Runtime context.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Sx`] | Context that creates commands and owns shared state |
//! | [`SxBuilder`] | Fluent configuration builder |
//! | [`SxOptions`] | Context settings |
//! | [`FailurePolicy`] | Chain behavior after a failed request |
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sxkit::{MemoryDocument, ReqwestTransport, Result, Sx, SwapMethod};
//!
//! # async fn example() -> Result<()> {
//! let sx = Sx::builder()
//!     .document(Arc::new(MemoryDocument::new()))
//!     .transport(Arc::new(ReqwestTransport::new()?))
//!     .build()?;
//!
//! sx.select("#list").get("/items").swap(SwapMethod::BeforeEnd).settled().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for context configuration.
pub mod builder;

/// Core context implementation.
pub mod core;

/// Context settings.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SxBuilder;
pub use self::core::Sx;
pub use options::{FailurePolicy, SxOptions};

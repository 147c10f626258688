//! Chainable commands.
//!
//! A [`Command`] targets one node and accumulates a chain of operations.
//! Requests race ahead; fill, swap and effect steps run in declaration
//! order, each observing the response of the request declared before it.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Command struct, accessors and fluent operations |
//! | `chain` | Step queue and worker |
//! | `polling` | Timed replay and stop |
//!
//! # Example
//!
//! ```ignore
//! use sxkit::{Effect, OobConfig, SwapMethod};
//!
//! sx.select("#profile")
//!     .post("/profile", "#profile")
//!     .catch(|e| eprintln!("save failed: {e}"))
//!     .oob([OobConfig::target("#flash").with_swap(SwapMethod::InnerHtml)])
//!     .fill()
//!     .effect(Effect::FadeIn)
//!     .settled()
//!     .await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod chain;
mod core;
mod polling;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{Command, ErrorHandler};

// ============================================================================
// Tests
// ============================================================================

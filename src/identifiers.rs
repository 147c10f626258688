//! Type-safe identifier wrappers.
//!
//! Newtypes keep node handles and timer handles from being mixed up at
//! compile time.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`NodeId`] | Handle to a node owned by a [`Document`](crate::dom::Document) |
//! | [`TimerId`] | Identity of a scheduled timer |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// NodeId
// ============================================================================

/// Handle to a document node.
///
/// Handles are issued by the document implementation and stay valid as
/// plain values after the node is detached; use
/// [`Document::contains`](crate::dom::Document::contains) to check liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a node ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

// ============================================================================
// TimerId
// ============================================================================

/// Next timer ID; process-wide so IDs from different timer sources never
/// collide in logs.
static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Generates a fresh timer ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::new(7).to_string(), "node-7");
    }

    #[test]
    fn test_timer_ids_are_unique() {
        let a = TimerId::generate();
        let b = TimerId::generate();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }
}

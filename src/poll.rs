//! Polling intervals and the keyed poll registry.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Interval`] | Poll period, from a duration, milliseconds or `"4s"`/`"500ms"` |
//! | [`PollRegistry`] | Keyed repeating timers, at most one per key |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::timer::TimerHandle;

// ============================================================================
// Interval
// ============================================================================

/// `<digits>ms` or `<digits>s`.
static INTERVAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(ms|s)$").expect("valid regex"));

/// A poll period.
///
/// A zero interval means "do not poll".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval(Duration);

impl Interval {
    /// The zero interval.
    pub const ZERO: Interval = Interval(Duration::ZERO);

    /// Creates an interval of `millis` milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Returns the period.
    #[inline]
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Returns `true` for the zero interval.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0.as_millis())
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let captures = INTERVAL.captures(s).ok_or_else(|| {
            Error::invalid_argument(format!(
                "invalid interval format: {s}. Use \"4s\" or \"500ms\""
            ))
        })?;

        let value: u64 = captures[1]
            .parse()
            .map_err(|_| Error::invalid_argument(format!("interval out of range: {s}")))?;
        let millis = match &captures[2] {
            "s" => value.checked_mul(1000).ok_or_else(|| {
                Error::invalid_argument(format!("interval out of range: {s}"))
            })?,
            _ => value,
        };
        Ok(Self::from_millis(millis))
    }
}

impl From<Duration> for Interval {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl From<u64> for Interval {
    fn from(millis: u64) -> Self {
        Self::from_millis(millis)
    }
}

/// Lenient conversion: a malformed string is logged and yields
/// [`Interval::ZERO`]. Use [`str::parse`] to get the error instead.
impl From<&str> for Interval {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_else(|e: Error| {
            error!(interval = s, error = %e, "Invalid interval");
            Self::ZERO
        })
    }
}

// ============================================================================
// PollRegistry
// ============================================================================

/// Keyed polling timers.
///
/// Installing under a key cancels whatever was registered under it; the
/// swap happens under one lock so at most one timer per key is ever live.
/// Unkeyed timers are only tracked so [`clear`](Self::clear) can reach them.
#[derive(Debug, Default)]
pub struct PollRegistry {
    timers: Mutex<FxHashMap<String, TimerHandle>>,
    unkeyed: Mutex<Vec<TimerHandle>>,
}

impl PollRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the timer under `key`, if any, then registers the one
    /// returned by `start`.
    pub fn install(&self, key: &str, start: impl FnOnce() -> TimerHandle) {
        let mut timers = self.timers.lock();
        if let Some(previous) = timers.remove(key) {
            previous.cancel();
            debug!(key, "Replaced poll");
        }
        timers.insert(key.to_string(), start());
    }

    /// Cancels and removes the timer under `key`.
    ///
    /// Returns `true` if one was registered.
    pub fn stop(&self, key: &str) -> bool {
        match self.timers.lock().remove(key) {
            Some(handle) => {
                handle.cancel();
                debug!(key, "Poll stopped");
                true
            }
            None => false,
        }
    }

    /// Returns `true` while a timer is registered under `key`.
    #[must_use]
    pub fn is_active(&self, key: &str) -> bool {
        self.timers.lock().contains_key(key)
    }

    /// Number of registered timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.lock().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.lock().is_empty()
    }

    /// Tracks an unkeyed timer, forgetting those already cancelled.
    pub fn track(&self, handle: TimerHandle) {
        let mut unkeyed = self.unkeyed.lock();
        unkeyed.retain(|existing| !existing.is_cancelled());
        unkeyed.push(handle);
    }

    /// Cancels and removes every timer, keyed or not. Returns how many
    /// keyed timers there were.
    pub fn clear(&self) -> usize {
        for handle in self.unkeyed.lock().drain(..) {
            handle.cancel();
        }
        let drained: Vec<_> = self.timers.lock().drain().collect();
        for (_, handle) in &drained {
            handle.cancel();
        }
        drained.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_parse() {
        assert_eq!("500ms".parse::<Interval>().unwrap(), Interval::from_millis(500));
        assert_eq!("4s".parse::<Interval>().unwrap(), Interval::from_millis(4000));
        assert_eq!("0s".parse::<Interval>().unwrap(), Interval::ZERO);

        for bad in ["4", "4 s", "1.5s", "-1s", "4m", ""] {
            assert!(bad.parse::<Interval>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_interval_lenient_conversion() {
        assert_eq!(Interval::from("2s"), Interval::from_millis(2000));
        assert_eq!(Interval::from("soon"), Interval::ZERO);
        assert!(Interval::from("soon").is_zero());
    }

    #[test]
    fn test_interval_numeric_and_duration() {
        assert_eq!(Interval::from(750_u64), Interval::from_millis(750));
        assert_eq!(
            Interval::from(Duration::from_secs(3)).as_duration(),
            Duration::from_secs(3)
        );
        assert_eq!(Interval::from_millis(1500).to_string(), "1500ms");
    }

    #[test]
    fn test_interval_overflow_is_rejected() {
        assert!("99999999999999999999s".parse::<Interval>().is_err());
        assert!(format!("{}s", u64::MAX).parse::<Interval>().is_err());
    }

    #[test]
    fn test_install_replaces_and_cancels() {
        let registry = PollRegistry::new();
        let first = TimerHandle::new();
        let second = TimerHandle::new();

        registry.install("feed", || first.clone());
        registry.install("feed", || second.clone());

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stop_and_clear() {
        let registry = PollRegistry::new();
        let a = TimerHandle::new();
        let b = TimerHandle::new();
        registry.install("a", || a.clone());
        registry.install("b", || b.clone());

        assert!(registry.stop("a"));
        assert!(!registry.stop("a"));
        assert!(a.is_cancelled());
        assert!(!registry.is_active("a"));
        assert!(registry.is_active("b"));

        assert_eq!(registry.clear(), 1);
        assert!(b.is_cancelled());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_cancels_unkeyed() {
        let registry = PollRegistry::new();
        let stale = TimerHandle::new();
        let live = TimerHandle::new();
        registry.track(stale.clone());
        stale.cancel();
        registry.track(live.clone());

        assert_eq!(registry.clear(), 0);
        assert!(live.is_cancelled());
    }
}

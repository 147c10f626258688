//! Timer collaborator.
//!
//! Polling and effect reverts schedule work through the [`Timers`] trait
//! and keep the returned [`TimerHandle`] to cancel it. [`TokioTimers`] is
//! the default implementation.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use sxkit::timer::{Timers, TokioTimers};
//!
//! let timers = TokioTimers::new();
//! let handle = timers.every(Duration::from_secs(5), Box::new(|| println!("tick")));
//! handle.cancel();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::trace;

use crate::identifiers::TimerId;

// ============================================================================
// Types
// ============================================================================

/// Callback run on every tick of a repeating timer.
pub type TickFn = Box<dyn Fn() + Send + Sync + 'static>;

/// Callback run once when a one-shot timer fires.
pub type OnceFn = Box<dyn FnOnce() + Send + 'static>;

// ============================================================================
// TimerHandle
// ============================================================================

/// Cancellable handle to a scheduled timer.
///
/// Cancelling is idempotent. Timer implementations must check
/// [`is_cancelled`](Self::is_cancelled) before running a callback.
#[derive(Clone)]
pub struct TimerHandle {
    id: TimerId,
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl TimerHandle {
    /// Creates a live handle with no backing task.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: TimerId::generate(),
            cancelled: Arc::new(AtomicBool::new(false)),
            abort: None,
        }
    }

    /// Attaches the task driving this timer so cancelling aborts it.
    #[must_use]
    pub fn with_abort(mut self, abort: AbortHandle) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Returns the timer ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Cancels the timer.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            trace!(timer_id = %self.id, "Timer cancelled");
        }
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Returns `true` once the timer has been cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Timers
// ============================================================================

/// Schedules repeating and one-shot callbacks.
pub trait Timers: Send + Sync {
    /// Runs `tick` every `period`, first after one full period.
    fn every(&self, period: Duration, tick: TickFn) -> TimerHandle;

    /// Runs `task` once after `delay`.
    fn after(&self, delay: Duration, task: OnceFn) -> TimerHandle;
}

// ============================================================================
// TokioTimers
// ============================================================================

/// [`Timers`] backed by Tokio tasks.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimers;

impl TokioTimers {
    /// Creates the Tokio timer source.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Timers for TokioTimers {
    fn every(&self, period: Duration, tick: TickFn) -> TimerHandle {
        let handle = TimerHandle::new();
        let guard = handle.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if guard.is_cancelled() {
                    break;
                }
                trace!(timer_id = %guard.id(), "Timer tick");
                tick();
            }
        });

        handle.with_abort(task.abort_handle())
    }

    fn after(&self, delay: Duration, task: OnceFn) -> TimerHandle {
        let handle = TimerHandle::new();
        let guard = handle.clone();

        let join = tokio::spawn(async move {
            sleep(delay).await;
            if !guard.is_cancelled() {
                task();
            }
        });

        handle.with_abort(join.abort_handle())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_every_ticks_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = TokioTimers::new().every(
            Duration::from_millis(100),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        handle.cancel();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_fires_once() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        TokioTimers::new().after(
            Duration::from_millis(200),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        sleep(Duration::from_millis(199)).await;
        assert!(!fired.load(Ordering::SeqCst));
        sleep(Duration::from_millis(2)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_after_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = TokioTimers::new().after(
            Duration::from_millis(50),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        handle.cancel();
        sleep(Duration::from_millis(100)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_handle_cancel_is_idempotent() {
        let handle = TimerHandle::new();
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
    }
}

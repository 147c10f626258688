//! Repeating a command on a timer.

use tracing::{debug, error, trace};

use crate::poll::Interval;

use super::chain::Step;
use super::core::Command;

impl Command {
    /// Replays the command every `interval`.
    ///
    /// Each tick re-sends the last request (a POST re-serializes its form)
    /// and re-queues fill, swap and effect if they were declared. A keyed
    /// poll replaces any poll under the same key in the context; an
    /// unkeyed poll replaces this command's previous unkeyed poll. A zero
    /// interval, including a malformed interval string, installs nothing.
    #[must_use]
    pub fn poll(self, interval: impl Into<Interval>, key: Option<&str>) -> Self {
        let interval = interval.into();
        if interval.is_zero() {
            error!(selector = %self.shared.selector, "Zero poll interval, not polling");
            return self;
        }

        let ctx = &self.shared.ctx;
        let period = interval.as_duration();
        let ticker = self.clone();
        let start = || ctx.timers.every(period, Box::new(move || ticker.replay()));

        match key {
            Some(key) => ctx.registry.install(key, start),
            None => {
                let handle = start();
                ctx.registry.track(handle.clone());
                if let Some(previous) = self.shared.state.lock().timer.replace(handle) {
                    previous.cancel();
                }
            }
        }

        debug!(selector = %self.shared.selector, %interval, key, "Polling");
        self
    }

    /// Stops polling.
    ///
    /// With a key, stops the context's poll under that key, whichever
    /// command installed it. Without one, stops this command's unkeyed
    /// poll.
    #[must_use]
    pub fn stop(self, key: Option<&str>) -> Self {
        match key {
            Some(key) => {
                self.shared.ctx.registry.stop(key);
            }
            None => {
                if let Some(timer) = self.shared.state.lock().timer.take() {
                    timer.cancel();
                    debug!(selector = %self.shared.selector, "Poll stopped");
                }
            }
        }
        self
    }

    /// Re-runs the declared shape of the chain once.
    pub(crate) fn replay(&self) {
        let (request, fill, swap, effect) = {
            let state = self.shared.state.lock();
            (
                state.last_request.clone(),
                state.fill,
                state.swap,
                state.effect,
            )
        };
        trace!(selector = %self.shared.selector, "Poll tick");

        if let Some(spec) = request {
            self.dispatch(spec);
        }
        if fill {
            self.enqueue(Step::Fill);
        }
        if let Some(method) = swap {
            self.enqueue(Step::Swap(method));
        }
        if let Some((effect, duration)) = effect {
            self.enqueue(Step::Effect(effect, duration));
        }
    }
}

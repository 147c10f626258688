//! The chain worker.
//!
//! Each command owns one worker task fed by an unbounded channel of
//! [`Step`]s. The worker runs steps strictly in the order they were sent
//! and carries the chain outcome between them:
//!
//! - an exchange step waits for its request and replaces the outcome with
//!   the request's result, filtered through the failure policy
//! - fill, swap and effect steps are skipped while the outcome is an error
//! - a barrier step reports the current outcome
//!
//! Fill, swap and effect failures are logged and never change the outcome.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace};

use crate::effect::Effect;
use crate::error::{Error, Result};
use crate::form::fill_form;
use crate::identifiers::NodeId;
use crate::net::Method;
use crate::net::requester::Exchange;
use crate::oob::process_oob;
use crate::runtime::FailurePolicy;
use crate::swap::{SwapMethod, apply_swap};

use super::core::CommandShared;

// ============================================================================
// Step
// ============================================================================

/// One queued unit of chain work.
pub(crate) enum Step {
    /// Observe a request already in flight.
    Exchange {
        method: Method,
        url: String,
        result: oneshot::Receiver<Result<Exchange>>,
    },
    /// Fill the target form.
    Fill,
    /// Swap the response into the target.
    Swap(SwapMethod),
    /// Animate the target.
    Effect(Effect, Duration),
    /// Report the outcome so far.
    Barrier(oneshot::Sender<Result<()>>),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Self::Exchange { .. } => "exchange",
            Self::Fill => "fill",
            Self::Swap(_) => "swap",
            Self::Effect(..) => "effect",
            Self::Barrier(_) => "barrier",
        }
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Runs steps until every sender is gone.
pub(crate) async fn run(shared: Arc<CommandShared>, mut steps: mpsc::UnboundedReceiver<Step>) {
    let mut outcome: Result<()> = Ok(());

    while let Some(step) = steps.recv().await {
        match step {
            Step::Exchange {
                method,
                url,
                result,
            } => {
                let result = result.await.unwrap_or(Err(Error::ChainClosed));
                outcome = shared.settle_exchange(method, &url, result);
            }
            Step::Barrier(waiter) => {
                let _ = waiter.send(outcome.clone());
            }
            skipped if outcome.is_err() => {
                trace!(
                    selector = %shared.selector,
                    step = skipped.name(),
                    "Step skipped after failed request"
                );
            }
            Step::Fill => shared.run_fill(),
            Step::Swap(method) => shared.run_swap(method),
            Step::Effect(effect, duration) => shared.run_effect(effect, duration),
        }
    }

    trace!(selector = %shared.selector, "Chain worker finished");
}

// ============================================================================
// Step Execution
// ============================================================================

impl CommandShared {
    /// Stores a finished exchange and decides the new outcome.
    fn settle_exchange(&self, method: Method, url: &str, result: Result<Exchange>) -> Result<()> {
        let error = match result {
            Ok(exchange) => {
                self.state.lock().response = Some(exchange);
                return Ok(());
            }
            Err(e) => e,
        };

        let handler = {
            let mut state = self.state.lock();
            state.response = None;
            state.error_handler.clone()
        };

        match handler {
            Some(handler) => handler(&error),
            None => error!(
                selector = %self.selector,
                %method,
                url,
                error = %error,
                "Request failed"
            ),
        }

        match self.ctx.options.failure_policy {
            FailurePolicy::Propagate => Err(error),
            FailurePolicy::Recover => Ok(()),
        }
    }

    /// Returns the target while it is still in the document.
    fn live_target(&self) -> Option<NodeId> {
        self.target
            .filter(|node| self.ctx.document.contains(*node))
    }

    pub(crate) fn run_fill(&self) {
        let document = self.ctx.document.as_ref();

        let Some(form) = self.live_target() else {
            let e = Error::element_not_found(&self.selector);
            error!(error = %e, "Fill skipped");
            return;
        };
        if !document.kind(form).is_some_and(|kind| kind.is_form()) {
            let e = Error::not_a_form(&self.selector);
            error!(error = %e, "Fill skipped");
            return;
        }

        let record = {
            let state = self.state.lock();
            match &state.response {
                Some(exchange) => exchange.structured.clone(),
                None => {
                    error!(selector = %self.selector, "Fill skipped: no response");
                    return;
                }
            }
        };
        let Some(record) = record else {
            let e = Error::parse("response is not a keyed value");
            error!(selector = %self.selector, error = %e, "Fill skipped");
            return;
        };

        let report = fill_form(document, form, &record);
        debug!(
            selector = %self.selector,
            populated = report.populated,
            warnings = report.warnings.len(),
            "Fill step done"
        );
    }

    pub(crate) fn run_swap(&self, method: SwapMethod) {
        let Some(node) = self.live_target() else {
            let e = Error::element_not_found(&self.selector);
            error!(error = %e, %method, "Swap skipped");
            return;
        };

        let html = self
            .state
            .lock()
            .response
            .as_ref()
            .map(|exchange| exchange.text.clone())
            .filter(|text| !text.is_empty());
        let Some(html) = html else {
            debug!(selector = %self.selector, %method, "Nothing to swap");
            return;
        };

        apply_swap(
            self.ctx.document.as_ref(),
            &self.ctx.effects,
            node,
            method,
            &html,
        );
    }

    pub(crate) fn run_effect(&self, effect: Effect, duration: Duration) {
        let Some(node) = self.live_target() else {
            let e = Error::element_not_found(&self.selector);
            error!(error = %e, %effect, "Effect skipped");
            return;
        };
        self.ctx.effects.apply(node, effect, duration);
    }

    /// Applies the command's OOB configs with `html`.
    pub(crate) fn run_oob(&self, html: &str) {
        let configs = self.state.lock().oob.clone();
        if configs.is_empty() {
            return;
        }
        process_oob(
            self.ctx.document.as_ref(),
            &self.ctx.effects,
            &configs,
            &self.selector,
            html,
            self.ctx.options.default_effect_duration,
        );
    }
}

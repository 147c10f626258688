//! Core Command struct, accessors and fluent operations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::effect::Effect;
use crate::error::{Error, Result};
use crate::identifiers::NodeId;
use crate::net::requester::{self, Exchange, RequestSpec};
use crate::net::Method;
use crate::oob::OobConfig;
use crate::runtime::core::SxInner;
use crate::swap::SwapMethod;
use crate::timer::TimerHandle;
use crate::value::Record;

use super::chain::{self, Step};

// ============================================================================
// Types
// ============================================================================

/// Callback invoked with every failed request of a command.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync + 'static>;

/// Mutable state accumulated across a command's calls.
#[derive(Default)]
pub(crate) struct CommandState {
    /// Last exchange reached in chain order; cleared when a request fails.
    pub response: Option<Exchange>,
    /// Handler for failed requests.
    pub error_handler: Option<ErrorHandler>,
    /// Out-of-band updates run on every successful exchange.
    pub oob: Vec<OobConfig>,
    /// Whether `fill` was requested; replayed by polling.
    pub fill: bool,
    /// Last swap method; replayed by polling.
    pub swap: Option<SwapMethod>,
    /// Last effect and its duration; replayed by polling.
    pub effect: Option<(Effect, Duration)>,
    /// Last request; replayed by polling.
    pub last_request: Option<RequestSpec>,
    /// Unkeyed poll timer.
    pub timer: Option<TimerHandle>,
}

/// State shared by every clone of a command and its chain worker.
pub(crate) struct CommandShared {
    /// Selector the command was created with.
    pub selector: String,
    /// Node matched at creation.
    pub target: Option<NodeId>,
    /// Owning context.
    pub ctx: Arc<SxInner>,
    /// Mutable state; never held across an await.
    pub state: Mutex<CommandState>,
}

// ============================================================================
// Command
// ============================================================================

/// A chain of operations on one target.
///
/// Requests start as soon as they are declared; `fill`, `swap` and
/// `effect` run in declaration order on the command's chain, each after
/// everything declared before it has settled. Clones share the same chain.
///
/// Create commands with [`Sx::select`](crate::Sx::select). Must be created
/// inside a Tokio runtime.
#[derive(Clone)]
pub struct Command {
    pub(crate) shared: Arc<CommandShared>,
    pub(crate) steps: mpsc::UnboundedSender<Step>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("selector", &self.shared.selector)
            .field("target", &self.shared.target)
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Creates a command for `selector`, resolving its target once.
    pub(crate) fn new(ctx: Arc<SxInner>, selector: impl Into<String>) -> Self {
        let selector = selector.into();
        let target = ctx.document.query(&selector);
        if target.is_none() {
            debug!(selector = %selector, "Command target not found");
        }

        let shared = Arc::new(CommandShared {
            selector,
            target,
            ctx,
            state: Mutex::new(CommandState::default()),
        });

        let (steps, receiver) = mpsc::unbounded_channel();
        tokio::spawn(chain::run(Arc::clone(&shared), receiver));

        Self { shared, steps }
    }
}

// ============================================================================
// Command - Accessors
// ============================================================================

impl Command {
    /// Returns the selector the command was created with.
    #[inline]
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.shared.selector
    }

    /// Returns the node matched at creation.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<NodeId> {
        self.shared.target
    }

    /// Returns the raw text of the last exchange reached in chain order.
    #[must_use]
    pub fn response(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .response
            .as_ref()
            .map(|exchange| exchange.text.clone())
    }

    /// Returns the structured form of the last exchange, if it had one.
    #[must_use]
    pub fn structured(&self) -> Option<Record> {
        self.shared
            .state
            .lock()
            .response
            .as_ref()
            .and_then(|exchange| exchange.structured.clone())
    }
}

// ============================================================================
// Command - Requests
// ============================================================================

impl Command {
    /// Sends a GET request.
    #[must_use]
    pub fn get(self, url: &str) -> Self {
        self.request(Method::Get, url, None)
    }

    /// Posts the form matched by `form_selector` as JSON.
    #[must_use]
    pub fn post(self, url: &str, form_selector: &str) -> Self {
        self.request(Method::Post, url, Some(form_selector))
    }

    /// Sends a request.
    ///
    /// The request starts now; its response becomes visible to the steps
    /// declared after it. A POST with a form serializes the form now.
    #[must_use]
    pub fn request(self, method: Method, url: &str, form_selector: Option<&str>) -> Self {
        let spec = RequestSpec::new(method, url, form_selector);
        self.shared.state.lock().last_request = Some(spec.clone());
        self.dispatch(spec);
        self
    }

    /// Starts the exchange for `spec` and queues the step that observes it.
    pub(crate) fn dispatch(&self, spec: RequestSpec) {
        let ctx = &self.shared.ctx;
        let prepared = requester::prepare(ctx.document.as_ref(), &ctx.options, &spec);
        let (result_tx, result_rx) = oneshot::channel();

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let result = match prepared {
                Ok(request) => requester::perform(shared.ctx.transport.as_ref(), request).await,
                Err(e) => Err(e),
            };
            if let Ok(exchange) = &result {
                shared.run_oob(&exchange.text);
            }
            let _ = result_tx.send(result);
        });

        self.enqueue(Step::Exchange {
            method: spec.method,
            url: spec.url,
            result: result_rx,
        });
    }
}

// ============================================================================
// Command - Chain Steps
// ============================================================================

impl Command {
    /// Fills the target form from the structured response.
    #[must_use]
    pub fn fill(self) -> Self {
        self.shared.state.lock().fill = true;
        self.enqueue(Step::Fill);
        self
    }

    /// Writes the response into the target.
    #[must_use]
    pub fn swap(self, method: SwapMethod) -> Self {
        self.shared.state.lock().swap = Some(method);
        self.enqueue(Step::Swap(method));
        self
    }

    /// Runs `effect` on the target for the default duration.
    #[must_use]
    pub fn effect(self, effect: Effect) -> Self {
        let duration = self.shared.ctx.options.default_effect_duration;
        self.effect_for(effect, duration)
    }

    /// Runs `effect` on the target for `duration`.
    #[must_use]
    pub fn effect_for(self, effect: Effect, duration: Duration) -> Self {
        self.shared.state.lock().effect = Some((effect, duration));
        self.enqueue(Step::Effect(effect, duration));
        self
    }

    /// Adds out-of-band updates, applied on every successful exchange
    /// that completes from now on.
    #[must_use]
    pub fn oob(self, configs: impl IntoIterator<Item = OobConfig>) -> Self {
        self.shared.state.lock().oob.extend(configs);
        self
    }

    /// Registers the handler for failed requests, replacing any earlier
    /// one. Without a handler failures are logged.
    #[must_use]
    pub fn catch<F>(self, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.shared.state.lock().error_handler = Some(Arc::new(handler));
        self
    }

    /// Waits until everything declared so far has settled.
    ///
    /// Returns the error of the last failed request when the context's
    /// [`FailurePolicy`](crate::FailurePolicy) propagates failures and no
    /// later request succeeded.
    ///
    /// # Errors
    ///
    /// - The propagated request error
    /// - [`Error::ChainClosed`] if the chain worker is gone
    pub async fn settled(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.steps
            .send(Step::Barrier(tx))
            .map_err(|_| Error::ChainClosed)?;
        rx.await.map_err(|_| Error::ChainClosed)?
    }

    pub(crate) fn enqueue(&self, step: Step) {
        if self.steps.send(step).is_err() {
            trace!(selector = %self.shared.selector, "Chain worker gone, step dropped");
        }
    }
}

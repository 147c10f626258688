//! Test doubles shared by unit tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::time::sleep;

use crate::dom::MemoryDocument;
use crate::error::{Error, Result};
use crate::net::{HttpRequest, HttpResponse, Method, Transport};
use crate::runtime::{Sx, SxOptions};

// ============================================================================
// Tracing
// ============================================================================

/// Installs a test subscriber once; honours `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// MockTransport
// ============================================================================

#[derive(Debug, Clone)]
enum Route {
    Respond {
        status: u16,
        body: String,
        delay: Duration,
    },
    Fail(String),
}

/// Scripted [`Transport`] that records every request it receives.
///
/// Unrouted requests answer `404`.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    routes: Mutex<FxHashMap<(Method, String), Route>>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn route(&self, method: Method, url: &str, status: u16, body: &str) {
        self.route_delayed(method, url, status, body, Duration::ZERO);
    }

    pub(crate) fn route_delayed(
        &self,
        method: Method,
        url: &str,
        status: u16,
        body: &str,
        delay: Duration,
    ) {
        self.routes.lock().insert(
            (method, url.to_string()),
            Route::Respond {
                status,
                body: body.to_string(),
                delay,
            },
        );
    }

    pub(crate) fn fail(&self, method: Method, url: &str, message: &str) {
        self.routes
            .lock()
            .insert((method, url.to_string()), Route::Fail(message.to_string()));
    }

    pub(crate) fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|call| call.url == url).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let route = self
            .routes
            .lock()
            .get(&(request.method, request.url.clone()))
            .cloned();
        self.calls.lock().push(request);

        match route {
            Some(Route::Respond {
                status,
                body,
                delay,
            }) => {
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                Ok(HttpResponse::new(status, body))
            }
            Some(Route::Fail(message)) => Err(Error::network(message)),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Builds a context over an in-memory document and a mock transport.
pub(crate) fn context(
    document: &Arc<MemoryDocument>,
    transport: &Arc<MockTransport>,
    options: SxOptions,
) -> Sx {
    init_tracing();
    Sx::builder()
        .document(Arc::clone(document) as Arc<dyn crate::dom::Document>)
        .transport(Arc::clone(transport) as Arc<dyn Transport>)
        .options(options)
        .build()
        .expect("valid test context")
}

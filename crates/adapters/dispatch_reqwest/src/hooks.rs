//! Response and error hooks invoked by connection actors.

use std::future::Future;

use pinhub_app::ports::LogSink;
use pinhub_domain::log::{LogEntry, Severity};

use crate::error::DispatchError;

/// What to do with request outcomes.
///
/// Hooks run on the actor's worker task, so they must not block on
/// anything owned by the dispatcher itself.
pub trait DispatchHooks: Send + Sync + 'static {
    /// A request succeeded with this response body.
    fn on_response(&self, device: &str, body: &str) -> impl Future<Output = ()> + Send;

    /// A request failed for good (bad response, exhausted retries,
    /// resolution failure).
    fn on_error(&self, device: &str, error: &DispatchError) -> impl Future<Output = ()> + Send;
}

/// Default hooks: response bodies are dropped, failures become error
/// entries in the audit log, tagged with the device.
pub struct LoggingHooks<S> {
    store: S,
}

impl<S> LoggingHooks<S> {
    /// Create hooks that log through the given sink.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: LogSink + 'static> DispatchHooks for LoggingHooks<S> {
    async fn on_response(&self, device: &str, body: &str) {
        tracing::debug!(device, body, "device request succeeded");
    }

    async fn on_error(&self, device: &str, error: &DispatchError) {
        tracing::error!(device, error = %error, "device request failed");
        let entry = LogEntry::new(Severity::Error, format!("Error sending request: {error}"))
            .with_device(device);
        if let Err(err) = self.store.append_log(&entry).await {
            tracing::error!(error = %err, "failed to record dispatch error");
        }
    }
}

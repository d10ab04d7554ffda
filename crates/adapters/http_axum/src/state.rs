//! Shared application state for axum handlers.

use std::sync::Arc;
use std::time::Duration;

use pinhub_app::engine::Engine;
use pinhub_app::ports::{ActionSender, StateStore};

/// Application state shared across all axum handlers.
///
/// Generic over the state store and action sender to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone` — only the `Arc` wrappers are
/// cloned.
pub struct AppState<S, A> {
    /// The evaluation pipeline.
    pub engine: Arc<Engine<S>>,
    /// Pool-level store access for the listing endpoints.
    pub store: Arc<S>,
    /// Submits dispatch actions without blocking on device IO.
    pub sender: Arc<A>,
    /// Devices silent for longer than this are reported dead.
    pub heartbeat_timeout: Duration,
}

impl<S, A> Clone for AppState<S, A> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            store: Arc::clone(&self.store),
            sender: Arc::clone(&self.sender),
            heartbeat_timeout: self.heartbeat_timeout,
        }
    }
}

impl<S, A> AppState<S, A>
where
    S: StateStore + 'static,
    A: ActionSender + 'static,
{
    /// Create a new application state.
    pub fn new(engine: Engine<S>, store: S, sender: A, heartbeat_timeout: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            store: Arc::new(store),
            sender: Arc::new(sender),
            heartbeat_timeout,
        }
    }
}

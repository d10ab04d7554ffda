//! The dispatcher — routes actions to per-address connection actors.
//!
//! One background task consumes an unbounded action queue. Executing a
//! request resolves the device's current address through the store,
//! lazily spawns the address's [`ConnectionActor`] and enqueues the
//! send; `ClearDevice` tears the actor down, letting queued requests
//! drain first. Submission through [`DispatcherHandle`] is queueing
//! only and never waits on network IO.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use pinhub_app::ports::{Action, ActionSender, ChannelClosed, DeviceResolver};
use pinhub_domain::error::HubError;

use crate::actor::ConnectionActor;
use crate::error::DispatchError;
use crate::hooks::DispatchHooks;
use crate::transport::{Connector, ReqwestConnector};

/// Tunables of the dispatch subsystem.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Timeout of each network operation against a device.
    pub request_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Spawn a dispatcher over the production reqwest transport.
///
/// Returns the non-blocking submission handle and the background task.
/// The task runs until every handle is dropped, then drains and tears
/// down all remaining actors before exiting.
pub fn spawn<R, H>(resolver: R, hooks: H, config: &DispatchConfig) -> (DispatcherHandle, JoinHandle<()>)
where
    R: DeviceResolver + 'static,
    H: DispatchHooks,
{
    spawn_with(resolver, ReqwestConnector::new(config.request_timeout), hooks)
}

/// Spawn a dispatcher over an injected transport.
pub fn spawn_with<R, C, H>(resolver: R, connector: C, hooks: H) -> (DispatcherHandle, JoinHandle<()>)
where
    R: DeviceResolver + 'static,
    C: Connector,
    H: DispatchHooks,
{
    let (queue, actions) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher {
        resolver,
        connector: Arc::new(connector),
        hooks: Arc::new(hooks),
        actors: HashMap::new(),
        actions,
    };
    (DispatcherHandle { queue }, tokio::spawn(dispatcher.run()))
}

/// Submits actions to the dispatcher queue.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    queue: mpsc::UnboundedSender<Action>,
}

impl ActionSender for DispatcherHandle {
    async fn send(&self, action: Action) -> Result<(), HubError> {
        self.queue.send(action).map_err(|_| ChannelClosed.into())
    }
}

/// Owns the actor map and the store-resolution side of dispatch.
pub struct Dispatcher<R, C, H> {
    resolver: R,
    connector: Arc<C>,
    hooks: Arc<H>,
    actors: HashMap<(String, u16), ConnectionActor>,
    actions: mpsc::UnboundedReceiver<Action>,
}

impl<R, C, H> Dispatcher<R, C, H>
where
    R: DeviceResolver + 'static,
    C: Connector,
    H: DispatchHooks,
{
    /// Consume the action queue until it closes, then drain every
    /// remaining actor so queued requests are still delivered.
    pub async fn run(mut self) {
        while let Some(action) = self.actions.recv().await {
            self.handle(action).await;
        }
        for (_, actor) in self.actors.drain() {
            actor.teardown().await;
        }
        tracing::debug!("dispatcher stopped");
    }

    async fn handle(&mut self, action: Action) {
        match action {
            Action::Request { device, path } => match self.resolve(&device).await {
                Ok(address) => self.enqueue(address, &device, &path),
                Err(err) => self.hooks.on_error(&device, &err).await,
            },
            Action::ClearDevice { device } => match self.resolve(&device).await {
                Ok(address) => {
                    if let Some(actor) = self.actors.remove(&address) {
                        tracing::debug!(
                            device,
                            host = %address.0,
                            port = address.1,
                            "tearing down connection"
                        );
                        actor.teardown().await;
                    }
                }
                Err(err) => self.hooks.on_error(&device, &err).await,
            },
        }
    }

    async fn resolve(&self, device: &str) -> Result<(String, u16), DispatchError> {
        match self.resolver.device_address(device).await {
            Ok(Some(address)) => Ok(address),
            Ok(None) => Err(DispatchError::UnknownDevice(device.to_string())),
            Err(err) => Err(DispatchError::Resolve(err)),
        }
    }

    fn enqueue(&mut self, address: (String, u16), device: &str, path: &str) {
        if let Some(actor) = self.actors.get(&address) {
            if actor.send(device, path) {
                return;
            }
            // Worker gone; replace the actor below.
            self.actors.remove(&address);
        }
        let actor = ConnectionActor::spawn(
            Arc::clone(&self.connector),
            address.0.clone(),
            address.1,
            Arc::clone(&self.hooks),
        );
        let _ = actor.send(device, path);
        self.actors.insert(address, actor);
    }
}

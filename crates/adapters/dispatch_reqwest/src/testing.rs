//! Scripted transport and recording hooks shared by the dispatch tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use pinhub_app::ports::DeviceResolver;
use pinhub_domain::error::HubError;

use crate::error::DispatchError;
use crate::hooks::DispatchHooks;
use crate::transport::{Connection, Connector, TransportError};

/// Scripted result of one `get` on a fake connection.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Outcome {
    /// Succeed with this body.
    Ok(&'static str),
    /// Answer with this HTTP status (non-2xx).
    Status(u16),
    /// Fail below the HTTP layer.
    Broken,
    /// Park until the test calls [`FakeConnector::release`], then
    /// succeed with this body.
    Hold(&'static str),
}

#[derive(Default)]
struct FakeState {
    opened: usize,
    script: VecDeque<Outcome>,
    per_host: HashMap<String, VecDeque<Outcome>>,
    requests: Vec<String>,
}

impl FakeState {
    fn next_outcome(&mut self, host: &str) -> Outcome {
        self.per_host
            .get_mut(host)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.script.pop_front())
            .unwrap_or(Outcome::Ok(""))
    }
}

/// Connector whose connections answer from a scripted outcome queue.
#[derive(Default, Clone)]
pub(crate) struct FakeConnector {
    state: Arc<Mutex<FakeState>>,
    gate: Arc<Semaphore>,
}

impl FakeConnector {
    pub(crate) fn script(&self, outcome: Outcome) {
        self.state.lock().unwrap().script.push_back(outcome);
    }

    /// Script an outcome consumed only by connections to `host`.
    pub(crate) fn script_for(&self, host: &str, outcome: Outcome) {
        self.state
            .lock()
            .unwrap()
            .per_host
            .entry(host.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Unpark one [`Outcome::Hold`].
    pub(crate) fn release(&self) {
        self.gate.add_permits(1);
    }

    pub(crate) fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    /// Paths requested so far, in execution order.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl Connector for FakeConnector {
    type Conn = FakeConnection;

    fn open(&self, host: &str, _port: u16) -> Result<FakeConnection, TransportError> {
        self.state.lock().unwrap().opened += 1;
        Ok(FakeConnection {
            host: host.to_string(),
            state: Arc::clone(&self.state),
            gate: Arc::clone(&self.gate),
        })
    }
}

pub(crate) struct FakeConnection {
    host: String,
    state: Arc<Mutex<FakeState>>,
    gate: Arc<Semaphore>,
}

impl Connection for FakeConnection {
    async fn get(&mut self, path: &str) -> Result<String, TransportError> {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(path.to_string());
            state.next_outcome(&self.host)
        };
        match outcome {
            Outcome::Ok(body) => Ok(body.to_string()),
            Outcome::Status(status) => Err(TransportError::BadResponse { status }),
            Outcome::Broken => Err(TransportError::Failed(Box::new(std::io::Error::from(
                std::io::ErrorKind::ConnectionReset,
            )))),
            Outcome::Hold(body) => {
                if let Ok(permit) = self.gate.acquire().await {
                    permit.forget();
                }
                Ok(body.to_string())
            }
        }
    }
}

/// Hooks that record every invocation.
#[derive(Default, Clone)]
pub(crate) struct RecordingHooks {
    responses: Arc<Mutex<Vec<(String, String)>>>,
    errors: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingHooks {
    pub(crate) fn responses(&self) -> Vec<(String, String)> {
        self.responses.lock().unwrap().clone()
    }

    /// `(device, rendered error)` pairs.
    pub(crate) fn errors(&self) -> Vec<(String, String)> {
        self.errors.lock().unwrap().clone()
    }
}

impl DispatchHooks for RecordingHooks {
    async fn on_response(&self, device: &str, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push((device.to_string(), body.to_string()));
    }

    async fn on_error(&self, device: &str, error: &DispatchError) {
        self.errors
            .lock()
            .unwrap()
            .push((device.to_string(), error.to_string()));
    }
}

/// Resolver double answering from a fixed name → address table.
#[derive(Default, Clone)]
pub(crate) struct StaticResolver {
    addresses: Arc<Mutex<HashMap<String, (String, u16)>>>,
}

impl StaticResolver {
    pub(crate) fn insert(&self, device: &str, host: &str, port: u16) {
        self.addresses
            .lock()
            .unwrap()
            .insert(device.to_string(), (host.to_string(), port));
    }
}

impl DeviceResolver for StaticResolver {
    async fn device_address(&self, name: &str) -> Result<Option<(String, u16)>, HubError> {
        Ok(self.addresses.lock().unwrap().get(name).cloned())
    }
}

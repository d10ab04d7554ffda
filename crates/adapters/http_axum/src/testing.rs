//! In-memory port doubles shared by the router tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use pinhub_app::ports::{Action, ActionSender, DeviceResolver, LogSink, StateStore, StoreTx};
use pinhub_domain::device::Device;
use pinhub_domain::error::HubError;
use pinhub_domain::log::LogEntry;
use pinhub_domain::pin::{Pin, PinKind};
use pinhub_domain::report::ReportedPin;
use pinhub_domain::time::Timestamp;
use pinhub_domain::trigger::{Edge, InputTrigger};
use pinhub_domain::variable::Variable;

#[derive(Debug, Default, Clone)]
struct StoreData {
    devices: BTreeMap<String, Device>,
    pins: BTreeMap<(String, String), Pin>,
    variables: BTreeMap<String, Variable>,
    triggers: Vec<InputTrigger>,
    logs: Vec<LogEntry>,
}

/// Transactional in-memory state store: `begin` clones the data,
/// `commit` writes the clone back, dropping rolls back.
#[derive(Debug, Default, Clone)]
pub(crate) struct MemoryStore {
    inner: Arc<Mutex<StoreData>>,
}

impl MemoryStore {
    pub(crate) fn seed_device(&self, name: &str, last_seen: Timestamp) {
        self.inner.lock().unwrap().devices.insert(
            name.to_string(),
            Device {
                name: name.to_string(),
                host: "10.0.0.7".to_string(),
                port: 8080,
                version: 1,
                last_seen,
            },
        );
    }

    pub(crate) fn seed_output_pin(&self, device: &str, name: &str, expression: &str) {
        self.inner.lock().unwrap().pins.insert(
            (device.to_string(), name.to_string()),
            Pin {
                device: device.to_string(),
                name: name.to_string(),
                kind: PinKind::Output,
                expression: Some(expression.to_string()),
            },
        );
    }

    pub(crate) fn seed_log(&self, entry: LogEntry) {
        self.inner.lock().unwrap().logs.push(entry);
    }

    pub(crate) fn device(&self, name: &str) -> Option<Device> {
        self.inner.lock().unwrap().devices.get(name).cloned()
    }

    pub(crate) fn logs(&self) -> Vec<LogEntry> {
        self.inner.lock().unwrap().logs.clone()
    }
}

pub(crate) struct MemoryTx {
    staged: StoreData,
    target: Arc<Mutex<StoreData>>,
}

impl DeviceResolver for MemoryStore {
    async fn device_address(&self, name: &str) -> Result<Option<(String, u16)>, HubError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .devices
            .get(name)
            .map(|d| (d.host.clone(), d.port)))
    }
}

impl LogSink for MemoryStore {
    async fn append_log(&self, entry: &LogEntry) -> Result<(), HubError> {
        self.inner.lock().unwrap().logs.push(entry.clone());
        Ok(())
    }
}

impl StateStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, HubError> {
        Ok(MemoryTx {
            staged: self.inner.lock().unwrap().clone(),
            target: Arc::clone(&self.inner),
        })
    }

    async fn list_devices(&self) -> Result<Vec<Device>, HubError> {
        Ok(self.inner.lock().unwrap().devices.values().cloned().collect())
    }

    async fn find_device(&self, name: &str) -> Result<Option<Device>, HubError> {
        Ok(self.inner.lock().unwrap().devices.get(name).cloned())
    }

    async fn list_variables(&self) -> Result<Vec<Variable>, HubError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .variables
            .values()
            .cloned()
            .collect())
    }

    async fn upsert_variable(&self, name: &str, value: i64) -> Result<Variable, HubError> {
        let variable = Variable {
            name: name.to_string(),
            value,
        };
        self.inner
            .lock()
            .unwrap()
            .variables
            .insert(name.to_string(), variable.clone());
        Ok(variable)
    }

    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, HubError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .logs
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

impl StoreTx for MemoryTx {
    async fn devices(&mut self) -> Result<Vec<Device>, HubError> {
        Ok(self.staged.devices.values().cloned().collect())
    }

    async fn upsert_device(&mut self, device: &Device) -> Result<(), HubError> {
        self.staged
            .devices
            .insert(device.name.clone(), device.clone());
        Ok(())
    }

    async fn replace_pins(&mut self, device: &str, pins: &[ReportedPin]) -> Result<(), HubError> {
        self.staged
            .pins
            .retain(|(dev, name), _| dev != device || pins.iter().any(|p| p.name == *name));
        for reported in pins {
            let key = (device.to_string(), reported.name.clone());
            match self.staged.pins.get_mut(&key) {
                Some(pin) => pin.kind = reported.kind,
                None => {
                    self.staged.pins.insert(
                        key,
                        Pin {
                            device: device.to_string(),
                            name: reported.name.clone(),
                            kind: reported.kind,
                            expression: None,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    async fn output_pins(&mut self, device: Option<&str>) -> Result<Vec<Pin>, HubError> {
        Ok(self
            .staged
            .pins
            .values()
            .filter(|p| p.has_intended_state())
            .filter(|p| device.is_none_or(|d| p.device == d))
            .cloned()
            .collect())
    }

    async fn triggers_matching(
        &mut self,
        device: &str,
        pin: &str,
        edge: Edge,
    ) -> Result<Vec<InputTrigger>, HubError> {
        Ok(self
            .staged
            .triggers
            .iter()
            .filter(|t| t.device == device && t.pin == pin && t.edge.matches(edge))
            .cloned()
            .collect())
    }

    async fn variables(&mut self) -> Result<Vec<Variable>, HubError> {
        Ok(self.staged.variables.values().cloned().collect())
    }

    async fn save_variable(&mut self, variable: &Variable) -> Result<(), HubError> {
        self.staged
            .variables
            .insert(variable.name.clone(), variable.clone());
        Ok(())
    }

    async fn append_log(&mut self, entry: &LogEntry) -> Result<(), HubError> {
        self.staged.logs.push(entry.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), HubError> {
        *self.target.lock().unwrap() = self.staged;
        Ok(())
    }
}

/// Action sender double recording every submission.
#[derive(Debug, Default, Clone)]
pub(crate) struct CollectingSender {
    actions: Arc<Mutex<Vec<Action>>>,
}

impl CollectingSender {
    pub(crate) fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }
}

impl ActionSender for CollectingSender {
    async fn send(&self, action: Action) -> Result<(), HubError> {
        self.actions.lock().unwrap().push(action);
        Ok(())
    }
}

//! Pass-scoped evaluation context.
//!
//! One [`EvalContext`] lives for exactly one evaluation pass (one store
//! transaction). Variables are loaded once and mutated in place, so a
//! write from one expression is immediately visible to every later
//! evaluation in the same pass; dirty variables and buffered log entries
//! are written back through the transaction before commit.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use pinhub_domain::device::Device;
use pinhub_domain::error::HubError;
use pinhub_domain::expr::{
    DeviceScope, EvalError, LogScope, Namespace, ParseError, PinEvent, Program, Value,
    VariableScope,
};
use pinhub_domain::log::{LogEntry, Severity};
use pinhub_domain::time::Timestamp;
use pinhub_domain::variable::Variable;

use crate::ports::StoreTx;

/// Why a single expression did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionFailure {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// In-memory variable set with write-through dirty tracking.
pub(crate) struct VariableSet {
    values: HashMap<String, Variable>,
    dirty: HashSet<String>,
}

impl VariableSet {
    fn load(variables: Vec<Variable>) -> Self {
        Self {
            values: variables.into_iter().map(|v| (v.name.clone(), v)).collect(),
            dirty: HashSet::new(),
        }
    }

    /// Variables mutated during the pass, for write-back.
    fn dirty_variables(&self) -> impl Iterator<Item = &Variable> {
        self.dirty.iter().filter_map(|name| self.values.get(name))
    }
}

impl VariableScope for VariableSet {
    fn get(&mut self, name: &str) -> Result<i64, EvalError> {
        self.values
            .get(name)
            .map(|v| v.value)
            .ok_or_else(|| EvalError::UnknownVariable(name.to_string()))
    }

    fn set(&mut self, name: &str, value: i64) -> Result<i64, EvalError> {
        let variable = self
            .values
            .get_mut(name)
            .ok_or_else(|| EvalError::UnknownVariable(name.to_string()))?;
        self.dirty.insert(name.to_string());
        Ok(variable.set(value))
    }

    fn toggle(&mut self, name: &str, modulo: i64) -> Result<i64, EvalError> {
        let variable = self
            .values
            .get_mut(name)
            .ok_or_else(|| EvalError::UnknownVariable(name.to_string()))?;
        let value = variable.toggle(modulo).ok_or(EvalError::InvalidModulo)?;
        self.dirty.insert(name.to_string());
        Ok(value)
    }
}

/// Device aliveness as of the pass start, refreshed after device upserts.
pub(crate) struct DeviceView {
    devices: Vec<(String, bool)>,
}

impl DeviceView {
    fn load(devices: &[Device], now: Timestamp, heartbeat_timeout: Duration) -> Self {
        Self {
            devices: devices
                .iter()
                .map(|d| (d.name.clone(), d.is_alive(now, heartbeat_timeout)))
                .collect(),
        }
    }

    /// Aliveness of a device, `None` for unknown names.
    pub(crate) fn alive(&self, name: &str) -> Option<bool> {
        self.devices
            .iter()
            .find(|(device, _)| device == name)
            .map(|(_, alive)| *alive)
    }
}

impl DeviceScope for DeviceView {
    fn is_alive(&mut self, name: &str) -> Result<bool, EvalError> {
        self.alive(name)
            .ok_or_else(|| EvalError::UnknownDevice(name.to_string()))
    }

    fn count_alive(&mut self) -> i64 {
        self.devices.iter().filter(|(_, alive)| *alive).count() as i64
    }

    fn count_dead(&mut self) -> i64 {
        self.devices.iter().filter(|(_, alive)| !*alive).count() as i64
    }
}

/// `log` proxy implementation buffering entries with attribution.
struct LogRecorder<'a> {
    buffer: &'a mut Vec<LogEntry>,
    device: &'a str,
    pin: &'a str,
}

impl LogScope for LogRecorder<'_> {
    fn log(&mut self, message: &str) {
        self.buffer.push(
            LogEntry::new(Severity::Info, message)
                .with_device(self.device)
                .with_pin(self.pin),
        );
    }
}

/// Everything one evaluation pass reads and writes besides the store
/// queries themselves.
pub(crate) struct EvalContext {
    pub(crate) variables: VariableSet,
    pub(crate) devices: DeviceView,
    pub(crate) logs: Vec<LogEntry>,
    now: Timestamp,
    heartbeat_timeout: Duration,
}

impl EvalContext {
    /// Load variables and devices from the transaction.
    pub(crate) async fn load<T: StoreTx>(
        tx: &mut T,
        now: Timestamp,
        heartbeat_timeout: Duration,
    ) -> Result<Self, HubError> {
        let variables = tx.variables().await?;
        let devices = tx.devices().await?;
        Ok(Self {
            variables: VariableSet::load(variables),
            devices: DeviceView::load(&devices, now, heartbeat_timeout),
            logs: Vec::new(),
            now,
            heartbeat_timeout,
        })
    }

    /// Reload the device view after a device upsert changed it.
    pub(crate) async fn refresh_devices<T: StoreTx>(
        &mut self,
        tx: &mut T,
    ) -> Result<(), HubError> {
        let devices = tx.devices().await?;
        self.devices = DeviceView::load(&devices, self.now, self.heartbeat_timeout);
        Ok(())
    }

    /// Evaluate expression text for an output pin (no `pin`/`log`).
    pub(crate) fn evaluate_pin_expression(
        &mut self,
        text: &str,
    ) -> Result<Value, ExpressionFailure> {
        let program = Program::parse(text)?;
        let mut ns = Namespace::new(&mut self.variables, &mut self.devices);
        Ok(program.eval(&mut ns)?)
    }

    /// Evaluate a trigger's expression with `pin` and `log` bound.
    pub(crate) fn evaluate_trigger_expression(
        &mut self,
        text: &str,
        event: &PinEvent,
    ) -> Result<Value, ExpressionFailure> {
        let program = Program::parse(text)?;
        let mut recorder = LogRecorder {
            buffer: &mut self.logs,
            device: &event.device,
            pin: &event.pin,
        };
        let mut ns =
            Namespace::for_trigger(&mut self.variables, &mut self.devices, event, &mut recorder);
        Ok(program.eval(&mut ns)?)
    }

    /// Buffer a pipeline-produced log entry.
    pub(crate) fn record(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }

    /// Write dirty variables and buffered log entries back through the
    /// transaction.
    pub(crate) async fn flush<T: StoreTx>(self, tx: &mut T) -> Result<(), HubError> {
        for variable in self.variables.dirty_variables() {
            tx.save_variable(variable).await?;
        }
        for entry in &self.logs {
            tx.append_log(entry).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StateStore;
    use crate::testing::InMemoryStore;

    fn now() -> Timestamp {
        pinhub_domain::time::now()
    }

    const TIMEOUT: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn should_make_mutations_visible_within_the_pass() {
        let store = InMemoryStore::default();
        store.seed_variable("mode", 0);

        let mut tx = store.begin().await.unwrap();
        let mut ctx = EvalContext::load(&mut tx, now(), TIMEOUT).await.unwrap();

        ctx.evaluate_pin_expression("variable.set('mode', 4)").unwrap();
        let value = ctx.evaluate_pin_expression("variable.get('mode')").unwrap();
        assert_eq!(value, Value::Int(4));
    }

    #[tokio::test]
    async fn should_write_back_only_dirty_variables_on_flush() {
        let store = InMemoryStore::default();
        store.seed_variable("touched", 0);
        store.seed_variable("untouched", 9);

        let mut tx = store.begin().await.unwrap();
        let mut ctx = EvalContext::load(&mut tx, now(), TIMEOUT).await.unwrap();
        ctx.evaluate_pin_expression("variable.toggle('touched')").unwrap();
        ctx.flush(&mut tx).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.variable_value("touched"), Some(1));
        assert_eq!(store.variable_value("untouched"), Some(9));
    }

    #[tokio::test]
    async fn should_discard_mutations_when_transaction_is_dropped() {
        let store = InMemoryStore::default();
        store.seed_variable("mode", 0);

        {
            let mut tx = store.begin().await.unwrap();
            let mut ctx = EvalContext::load(&mut tx, now(), TIMEOUT).await.unwrap();
            ctx.evaluate_pin_expression("variable.set('mode', 5)").unwrap();
            ctx.flush(&mut tx).await.unwrap();
            // No commit.
        }

        assert_eq!(store.variable_value("mode"), Some(0));
    }

    #[tokio::test]
    async fn should_attribute_trigger_logs_to_the_triggering_pin() {
        let store = InMemoryStore::default();
        let mut tx = store.begin().await.unwrap();
        let mut ctx = EvalContext::load(&mut tx, now(), TIMEOUT).await.unwrap();

        let event = PinEvent {
            device: "porch".to_string(),
            pin: "button".to_string(),
            level: true,
        };
        ctx.evaluate_trigger_expression("log.log('pressed')", &event)
            .unwrap();

        assert_eq!(ctx.logs.len(), 1);
        assert_eq!(ctx.logs[0].severity, Severity::Info);
        assert_eq!(ctx.logs[0].message, "pressed");
        assert_eq!(ctx.logs[0].device.as_deref(), Some("porch"));
        assert_eq!(ctx.logs[0].pin.as_deref(), Some("button"));
    }

    #[tokio::test]
    async fn should_report_parse_failures_as_expression_failures() {
        let store = InMemoryStore::default();
        let mut tx = store.begin().await.unwrap();
        let mut ctx = EvalContext::load(&mut tx, now(), TIMEOUT).await.unwrap();

        let result = ctx.evaluate_pin_expression("variable.get(");
        assert!(matches!(result, Err(ExpressionFailure::Parse(_))));
    }
}

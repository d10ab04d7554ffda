//! The evaluation pipeline — one pass per device report or pin event.
//!
//! Every pass runs on a single store transaction and holds the engine's
//! pass lock, so concurrent reports cannot interleave partial reads with
//! writes; the transaction commits as a whole or rolls back as a whole.

pub(crate) mod context;
pub(crate) mod intent;
pub(crate) mod triggers;

use std::time::Duration;

use pinhub_domain::device::Device;
use pinhub_domain::error::{HubError, ValidationError};
use pinhub_domain::expr::PinEvent;
use pinhub_domain::log::{LogEntry, Severity};
use pinhub_domain::pin::PinKind;
use pinhub_domain::report::{DeviceReport, ReportKind};
use pinhub_domain::state::{IntendedState, StateDelta};

use crate::ports::{Action, StateStore, StoreTx};
use context::EvalContext;

/// Tunables of the evaluation pipeline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// A device with no report for this long is considered dead.
    pub heartbeat_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout: Duration::from_secs(60),
        }
    }
}

/// The reactive rule engine: computes intended states, detects drift,
/// processes triggers, and emits the dispatch actions that bring the
/// fleet back in line.
pub struct Engine<S> {
    store: S,
    config: EngineConfig,
    /// Serializes evaluation passes; expressions read *and* write
    /// variables, so a pass must be internally consistent.
    pass_lock: tokio::sync::Mutex<()>,
}

impl<S: StateStore> Engine<S> {
    /// Create an engine on top of the given store.
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            pass_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Process one device report and return the dispatch actions it
    /// produced, in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] for malformed reports and
    /// [`HubError::Storage`] when the transaction fails; in the latter
    /// case every change of the pass is rolled back.
    #[tracing::instrument(skip(self, report), fields(device = %report.device.name, kind = ?report.kind))]
    pub async fn process_report(&self, report: DeviceReport) -> Result<Vec<Action>, HubError> {
        let host = report
            .device
            .ip
            .clone()
            .ok_or(ValidationError::MissingAddress)?;
        let now = pinhub_domain::time::now();
        let device = Device {
            name: report.device.name.clone(),
            host,
            port: report.device.port,
            version: report.device.version,
            last_seen: now,
        };
        device.validate()?;

        let _pass = self.pass_lock.lock().await;
        let mut tx = self.store.begin().await?;
        let mut ctx = EvalContext::load(&mut tx, now, self.config.heartbeat_timeout).await?;
        let mut actions = Vec::new();

        // The report itself can change intended states: the device may
        // come back alive, and its pin set may change.
        let before = intent::intended_states(&mut tx, &mut ctx, None).await?;
        tx.upsert_device(&device).await?;
        if report.kind != ReportKind::Event {
            tx.replace_pins(&device.name, &report.pins).await?;
        }
        ctx.refresh_devices(&mut tx).await?;
        let after = intent::intended_states(&mut tx, &mut ctx, None).await?;
        push_delta(&mut actions, &before.diff(&after));

        if report.kind == ReportKind::Login {
            actions.push(Action::ClearDevice {
                device: device.name.clone(),
            });
        }

        let intended = intent::intended_states(&mut tx, &mut ctx, Some(&device.name)).await?;
        for pin in &report.pins {
            if report.kind == ReportKind::Event {
                if pin.kind == PinKind::Input {
                    let event = PinEvent {
                        device: device.name.clone(),
                        pin: pin.name.clone(),
                        level: pin.value.0,
                    };
                    let delta = triggers::fire_triggers(&mut tx, &mut ctx, &event).await?;
                    push_delta(&mut actions, &delta);
                }
            } else if pin.kind == PinKind::Output {
                // Drift: the device disagrees with the intended state.
                // Pins without an intended state are left alone.
                if let Some(value) = intended.get(&device.name, &pin.name) {
                    if value.truthy() != pin.value.0 {
                        tracing::warn!(
                            device = %device.name,
                            pin = %pin.name,
                            reported = pin.value.0,
                            "wrong value of pin"
                        );
                        ctx.record(
                            LogEntry::new(Severity::Warning, "Wrong value of pin.")
                                .with_device(&device.name)
                                .with_pin(&pin.name),
                        );
                        actions.push(Action::set_pin(
                            device.name.clone(),
                            &pin.name,
                            value.truthy(),
                        ));
                    }
                }
            }
        }

        ctx.flush(&mut tx).await?;
        tx.commit().await?;
        Ok(actions)
    }

    /// Run the trigger processor for one input-pin edge event and return
    /// the intended-state delta it caused.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Storage`] when the transaction fails.
    #[tracing::instrument(skip(self))]
    pub async fn process_pin_event(
        &self,
        device: &str,
        pin: &str,
        level: bool,
    ) -> Result<StateDelta, HubError> {
        let _pass = self.pass_lock.lock().await;
        let now = pinhub_domain::time::now();
        let mut tx = self.store.begin().await?;
        let mut ctx = EvalContext::load(&mut tx, now, self.config.heartbeat_timeout).await?;

        let event = PinEvent {
            device: device.to_string(),
            pin: pin.to_string(),
            level,
        };
        let delta = triggers::fire_triggers(&mut tx, &mut ctx, &event).await?;

        ctx.flush(&mut tx).await?;
        tx.commit().await?;
        Ok(delta)
    }

    /// Compute intended states, optionally for a single device.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Storage`] when the transaction fails.
    pub async fn intended_states(
        &self,
        device: Option<&str>,
    ) -> Result<IntendedState, HubError> {
        let _pass = self.pass_lock.lock().await;
        let now = pinhub_domain::time::now();
        let mut tx = self.store.begin().await?;
        let mut ctx = EvalContext::load(&mut tx, now, self.config.heartbeat_timeout).await?;

        let result = intent::intended_states(&mut tx, &mut ctx, device).await?;

        // Expressions may have mutated variables or logged failures.
        ctx.flush(&mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }
}

fn push_delta(actions: &mut Vec<Action>, delta: &StateDelta) {
    for (device, pin, value) in delta.entries() {
        actions.push(Action::set_pin(device, pin, value.truthy()));
    }
}

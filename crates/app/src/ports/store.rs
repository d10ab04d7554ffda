//! State store ports — transactional access to the hub's records.

use std::future::Future;

use pinhub_domain::device::Device;
use pinhub_domain::error::HubError;
use pinhub_domain::log::LogEntry;
use pinhub_domain::pin::Pin;
use pinhub_domain::report::ReportedPin;
use pinhub_domain::trigger::{Edge, InputTrigger};
use pinhub_domain::variable::Variable;

/// Resolve a device's current network address.
///
/// The one store query the dispatch subsystem needs, split out so its
/// test doubles stay small.
pub trait DeviceResolver: Send + Sync {
    /// The `(host, port)` of a device, or `None` for unknown names.
    fn device_address(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<(String, u16)>, HubError>> + Send;
}

/// Append entries to the audit trail outside the evaluation pipeline.
pub trait LogSink: Send + Sync {
    /// Persist one log entry.
    fn append_log(&self, entry: &LogEntry) -> impl Future<Output = Result<(), HubError>> + Send;
}

/// The full state store: one transaction per evaluation pass, plus the
/// single-shot queries the HTTP surface needs.
pub trait StateStore: DeviceResolver + LogSink {
    /// The store's unit of work. Dropping it without [`StoreTx::commit`]
    /// rolls every change back.
    type Tx: StoreTx;

    /// Open a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, HubError>> + Send;

    /// All devices.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, HubError>> + Send;

    /// One device by name, or `None` for unknown names.
    fn find_device(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Device>, HubError>> + Send;

    /// All variables.
    fn list_variables(&self) -> impl Future<Output = Result<Vec<Variable>, HubError>> + Send;

    /// Create or overwrite a variable.
    fn upsert_variable(
        &self,
        name: &str,
        value: i64,
    ) -> impl Future<Output = Result<Variable, HubError>> + Send;

    /// The most recent log entries, newest first.
    fn recent_logs(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LogEntry>, HubError>> + Send;
}

/// Queries and writes available inside one store transaction.
///
/// Every method runs against the transaction's view; nothing is visible
/// to other readers until [`commit`](Self::commit).
pub trait StoreTx: Send {
    /// All devices.
    fn devices(&mut self) -> impl Future<Output = Result<Vec<Device>, HubError>> + Send;

    /// Insert the device or update its address, version and `last_seen`.
    fn upsert_device(
        &mut self,
        device: &Device,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Replace a device's pin set wholesale: pins absent from `pins` are
    /// deleted, present ones upserted with any configured expression
    /// preserved.
    fn replace_pins(
        &mut self,
        device: &str,
        pins: &[ReportedPin],
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Output pins that carry expression text, optionally restricted to
    /// one device.
    fn output_pins(
        &mut self,
        device: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Pin>, HubError>> + Send;

    /// Triggers on the given pin whose configured edge matches `edge`
    /// (a `both` trigger matches every edge).
    fn triggers_matching(
        &mut self,
        device: &str,
        pin: &str,
        edge: Edge,
    ) -> impl Future<Output = Result<Vec<InputTrigger>, HubError>> + Send;

    /// All variables.
    fn variables(&mut self) -> impl Future<Output = Result<Vec<Variable>, HubError>> + Send;

    /// Write one variable's current value back.
    fn save_variable(
        &mut self,
        variable: &Variable,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Append one log entry.
    fn append_log(&mut self, entry: &LogEntry)
    -> impl Future<Output = Result<(), HubError>> + Send;

    /// Commit the transaction.
    fn commit(self) -> impl Future<Output = Result<(), HubError>> + Send;
}

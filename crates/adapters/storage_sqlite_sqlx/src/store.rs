//! `SQLite` implementation of the state store port.
//!
//! One struct implements the pool-level queries and hands out
//! [`SqliteTx`] transactions for evaluation passes. Dropping a
//! transaction without committing rolls every change back.

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite, SqlitePool, Transaction};

use pinhub_app::ports::{DeviceResolver, LogSink, StateStore, StoreTx};
use pinhub_domain::device::Device;
use pinhub_domain::error::HubError;
use pinhub_domain::log::{LogEntry, Severity};
use pinhub_domain::pin::{Pin, PinKind};
use pinhub_domain::report::ReportedPin;
use pinhub_domain::time::Timestamp;
use pinhub_domain::trigger::{Edge, InputTrigger};
use pinhub_domain::variable::Variable;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Device`]s.
struct DeviceRow(Device);

impl<'r> FromRow<'r, SqliteRow> for DeviceRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Device {
            name: row.try_get("name")?,
            host: row.try_get("host")?,
            port: row.try_get("port")?,
            version: row.try_get("version")?,
            last_seen: row.try_get::<Timestamp, _>("last_seen")?,
        }))
    }
}

/// Wrapper for converting database rows into domain [`Pin`]s.
struct PinRow(Pin);

impl<'r> FromRow<'r, SqliteRow> for PinRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        let kind = PinKind::from_str(&kind).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(Pin {
            device: row.try_get("device")?,
            name: row.try_get("name")?,
            kind,
            expression: row.try_get("expression")?,
        }))
    }
}

/// Wrapper for converting database rows into domain [`InputTrigger`]s.
struct TriggerRow(InputTrigger);

impl<'r> FromRow<'r, SqliteRow> for TriggerRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let edge: String = row.try_get("edge")?;
        let edge = Edge::from_str(&edge).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(InputTrigger {
            device: row.try_get("device")?,
            pin: row.try_get("pin")?,
            edge,
            expression: row.try_get("expression")?,
        }))
    }
}

/// Wrapper for converting database rows into domain [`Variable`]s.
struct VariableRow(Variable);

impl<'r> FromRow<'r, SqliteRow> for VariableRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Variable {
            name: row.try_get("name")?,
            value: row.try_get("value")?,
        }))
    }
}

/// Wrapper for converting database rows into domain [`LogEntry`]s.
struct LogRow(LogEntry);

impl<'r> FromRow<'r, SqliteRow> for LogRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let severity: String = row.try_get("severity")?;
        let severity =
            Severity::from_str(&severity).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(LogEntry {
            severity,
            message: row.try_get("message")?,
            device: row.try_get("device")?,
            pin: row.try_get("pin")?,
            time: row.try_get::<Timestamp, _>("time")?,
        }))
    }
}

const SELECT_DEVICES: &str = "SELECT name, host, port, version, last_seen FROM devices ORDER BY name";
const SELECT_DEVICE: &str = "SELECT name, host, port, version, last_seen FROM devices WHERE name = ?";
const SELECT_ADDRESS: &str = "SELECT host, port FROM devices WHERE name = ?";
const UPSERT_DEVICE: &str = "INSERT INTO devices (name, host, port, version, last_seen) \
     VALUES (?, ?, ?, ?, ?) \
     ON CONFLICT (name) DO UPDATE SET host = excluded.host, port = excluded.port, \
     version = excluded.version, last_seen = excluded.last_seen";

const SELECT_PIN_NAMES: &str = "SELECT name FROM pins WHERE device = ?";
const DELETE_PIN: &str = "DELETE FROM pins WHERE device = ? AND name = ?";
// Upserting preserves any configured expression: only the kind follows
// the report.
const UPSERT_PIN: &str = "INSERT INTO pins (device, name, kind, expression) \
     VALUES (?, ?, ?, NULL) \
     ON CONFLICT (device, name) DO UPDATE SET kind = excluded.kind";
const SELECT_OUTPUT_PINS: &str = "SELECT device, name, kind, expression FROM pins \
     WHERE kind = 'output' AND expression IS NOT NULL ORDER BY device, name";
const SELECT_OUTPUT_PINS_OF: &str = "SELECT device, name, kind, expression FROM pins \
     WHERE kind = 'output' AND expression IS NOT NULL AND device = ? ORDER BY name";
const SET_PIN_EXPRESSION: &str = "UPDATE pins SET expression = ? WHERE device = ? AND name = ?";

const INSERT_TRIGGER: &str =
    "INSERT INTO input_triggers (device, pin, edge, expression) VALUES (?, ?, ?, ?)";
const SELECT_TRIGGERS_MATCHING: &str = "SELECT device, pin, edge, expression FROM input_triggers \
     WHERE device = ? AND pin = ? AND (edge = ? OR edge = 'both') ORDER BY id";

const SELECT_VARIABLES: &str = "SELECT name, value FROM variables ORDER BY name";
const UPSERT_VARIABLE: &str = "INSERT INTO variables (name, value) VALUES (?, ?) \
     ON CONFLICT (name) DO UPDATE SET value = excluded.value";

const INSERT_LOG: &str =
    "INSERT INTO logs (severity, message, device, pin, time) VALUES (?, ?, ?, ?, ?)";
const SELECT_RECENT_LOGS: &str =
    "SELECT severity, message, device, pin, time FROM logs ORDER BY id DESC LIMIT ?";

/// `SQLite`-backed state store.
#[derive(Clone)]
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Create a store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Configure (or clear) the expression of an existing pin.
    ///
    /// Expressions are provisioned out of band; device reports never
    /// carry them.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Storage`] when the query fails.
    pub async fn set_pin_expression(
        &self,
        device: &str,
        pin: &str,
        expression: Option<&str>,
    ) -> Result<(), HubError> {
        sqlx::query(SET_PIN_EXPRESSION)
            .bind(expression)
            .bind(device)
            .bind(pin)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    /// Register a trigger on an existing input pin.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Storage`] when the pin does not exist or the
    /// query fails.
    pub async fn add_trigger(&self, trigger: &InputTrigger) -> Result<(), HubError> {
        sqlx::query(INSERT_TRIGGER)
            .bind(&trigger.device)
            .bind(&trigger.pin)
            .bind(trigger.edge.to_string())
            .bind(&trigger.expression)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

impl DeviceResolver for SqliteStateStore {
    async fn device_address(&self, name: &str) -> Result<Option<(String, u16)>, HubError> {
        let row: Option<(String, u16)> = sqlx::query_as(SELECT_ADDRESS)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row)
    }
}

impl LogSink for SqliteStateStore {
    async fn append_log(&self, entry: &LogEntry) -> Result<(), HubError> {
        sqlx::query(INSERT_LOG)
            .bind(entry.severity.to_string())
            .bind(&entry.message)
            .bind(&entry.device)
            .bind(&entry.pin)
            .bind(entry.time)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

impl StateStore for SqliteStateStore {
    type Tx = SqliteTx;

    async fn begin(&self) -> Result<SqliteTx, HubError> {
        let tx = self.pool.begin().await.map_err(StorageError::from)?;
        Ok(SqliteTx { tx })
    }

    async fn list_devices(&self) -> Result<Vec<Device>, HubError> {
        let rows: Vec<DeviceRow> = sqlx::query_as(SELECT_DEVICES)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    async fn find_device(&self, name: &str) -> Result<Option<Device>, HubError> {
        let row: Option<DeviceRow> = sqlx::query_as(SELECT_DEVICE)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|row| row.0))
    }

    async fn list_variables(&self) -> Result<Vec<Variable>, HubError> {
        let rows: Vec<VariableRow> = sqlx::query_as(SELECT_VARIABLES)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    async fn upsert_variable(&self, name: &str, value: i64) -> Result<Variable, HubError> {
        sqlx::query(UPSERT_VARIABLE)
            .bind(name)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Variable {
            name: name.to_string(),
            value,
        })
    }

    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, HubError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<LogRow> = sqlx::query_as(SELECT_RECENT_LOGS)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|row| row.0).collect())
    }
}

/// One `SQLite` transaction; rolls back on drop unless committed.
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTx for SqliteTx {
    async fn devices(&mut self) -> Result<Vec<Device>, HubError> {
        let rows: Vec<DeviceRow> = sqlx::query_as(SELECT_DEVICES)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    async fn upsert_device(&mut self, device: &Device) -> Result<(), HubError> {
        sqlx::query(UPSERT_DEVICE)
            .bind(&device.name)
            .bind(&device.host)
            .bind(device.port)
            .bind(device.version)
            .bind(device.last_seen)
            .execute(&mut *self.tx)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn replace_pins(&mut self, device: &str, pins: &[ReportedPin]) -> Result<(), HubError> {
        let existing: Vec<String> = sqlx::query_scalar(SELECT_PIN_NAMES)
            .bind(device)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(StorageError::from)?;

        for name in existing {
            if pins.iter().all(|pin| pin.name != name) {
                sqlx::query(DELETE_PIN)
                    .bind(device)
                    .bind(&name)
                    .execute(&mut *self.tx)
                    .await
                    .map_err(StorageError::from)?;
            }
        }

        for pin in pins {
            sqlx::query(UPSERT_PIN)
                .bind(device)
                .bind(&pin.name)
                .bind(pin.kind.to_string())
                .execute(&mut *self.tx)
                .await
                .map_err(StorageError::from)?;
        }

        Ok(())
    }

    async fn output_pins(&mut self, device: Option<&str>) -> Result<Vec<Pin>, HubError> {
        let query = match device {
            Some(device) => sqlx::query_as(SELECT_OUTPUT_PINS_OF).bind(device),
            None => sqlx::query_as(SELECT_OUTPUT_PINS),
        };
        let rows: Vec<PinRow> = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    async fn triggers_matching(
        &mut self,
        device: &str,
        pin: &str,
        edge: Edge,
    ) -> Result<Vec<InputTrigger>, HubError> {
        let rows: Vec<TriggerRow> = sqlx::query_as(SELECT_TRIGGERS_MATCHING)
            .bind(device)
            .bind(pin)
            .bind(edge.to_string())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    async fn variables(&mut self) -> Result<Vec<Variable>, HubError> {
        let rows: Vec<VariableRow> = sqlx::query_as(SELECT_VARIABLES)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    async fn save_variable(&mut self, variable: &Variable) -> Result<(), HubError> {
        sqlx::query(UPSERT_VARIABLE)
            .bind(&variable.name)
            .bind(variable.value)
            .execute(&mut *self.tx)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn append_log(&mut self, entry: &LogEntry) -> Result<(), HubError> {
        sqlx::query(INSERT_LOG)
            .bind(entry.severity.to_string())
            .bind(&entry.message)
            .bind(&entry.device)
            .bind(&entry.pin)
            .bind(entry.time)
            .execute(&mut *self.tx)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), HubError> {
        self.tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }
}

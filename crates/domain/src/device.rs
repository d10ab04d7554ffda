//! Device — a networked board exposing digital pins over HTTP.
//!
//! Devices are keyed by their unique name. They are created on the first
//! report from an unknown name and have their address and `last_seen`
//! refreshed on every report; they are never hard-deleted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::time::Timestamp;

/// A reporting device and its current network address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Unique device name (natural key).
    pub name: String,
    /// Host the device listens on for pin-set requests.
    pub host: String,
    /// TCP port of the device's HTTP endpoint.
    pub port: u16,
    /// Firmware version reported by the device.
    pub version: u32,
    /// When the device last reported.
    pub last_seen: Timestamp,
}

impl Device {
    /// Whether the device reported within the heartbeat timeout.
    ///
    /// A `last_seen` in the future (clock skew, a report racing the
    /// caller's `now`) counts as alive.
    #[must_use]
    pub fn is_alive(&self, now: Timestamp, heartbeat_timeout: Duration) -> bool {
        match (now - self.last_seen).to_std() {
            Ok(elapsed) => elapsed < heartbeat_timeout,
            Err(_) => true,
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when the name is empty or the
    /// port is zero.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.port == 0 {
            return Err(ValidationError::ZeroPort.into());
        }
        Ok(())
    }
}

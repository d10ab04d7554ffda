//! Device report — the payload a device posts to the hub.
//!
//! ```json
//! {
//!   "device": {"name": "bedroom", "ip": "10.0.0.7", "port": 8080, "version": 3},
//!   "pins": [{"name": "button", "type": "input", "value": 1}],
//!   "type": "event"
//! }
//! ```
//!
//! `ip` may be omitted; the ingestion endpoint fills it from the peer
//! address. Pin values arrive as JSON booleans or 0/1 integers depending
//! on firmware generation.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::pin::PinKind;

/// Why the device is reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// First report after (re)booting; the hub must drop any stale
    /// connection to the device.
    Login,
    /// An input pin changed; `pins` carries only the changed pins and
    /// the stored pin set is left untouched.
    Event,
    /// Periodic full report.
    #[default]
    Heartbeat,
}

/// Identity block of a report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportedDevice {
    pub name: String,
    #[serde(default)]
    pub ip: Option<String>,
    pub port: u16,
    #[serde(default)]
    pub version: u32,
}

/// One reported pin reading.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportedPin {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PinKind,
    pub value: PinLevel,
}

/// A full device report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceReport {
    pub device: ReportedDevice,
    #[serde(default)]
    pub pins: Vec<ReportedPin>,
    #[serde(rename = "type", default)]
    pub kind: ReportKind,
}

/// A digital level, tolerant of `true`/`false` and `1`/`0` wire forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinLevel(pub bool);

impl PinLevel {
    /// The level as the integer the expression language sees.
    #[must_use]
    pub fn as_int(self) -> i64 {
        i64::from(self.0)
    }
}

impl From<bool> for PinLevel {
    fn from(level: bool) -> Self {
        Self(level)
    }
}

impl<'de> Deserialize<'de> for PinLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LevelVisitor;

        impl de::Visitor<'_> for LevelVisitor {
            type Value = PinLevel;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a boolean or a 0/1 integer")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<PinLevel, E> {
                Ok(PinLevel(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<PinLevel, E> {
                Ok(PinLevel(v != 0))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PinLevel, E> {
                Ok(PinLevel(v != 0))
            }
        }

        deserializer.deserialize_any(LevelVisitor)
    }
}

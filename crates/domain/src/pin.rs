//! Pin — a single digital line belonging to a device.
//!
//! Pins are replaced wholesale when a device sends a full report: pins
//! absent from the report are deleted, present ones upserted. An output
//! pin may carry expression text that defines its intended state; the
//! expression is a value object owned by the pin, with no lifecycle of
//! its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    /// The device reads this pin and reports edge events.
    Input,
    /// The hub drives this pin towards its intended state.
    Output,
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Parse failure for [`PinKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pin kind: {0:?}")]
pub struct ParsePinKindError(pub String);

impl FromStr for PinKind {
    type Err = ParsePinKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            other => Err(ParsePinKindError(other.to_string())),
        }
    }
}

/// A pin, unique per `(device, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    /// Name of the owning device.
    pub device: String,
    /// Pin name, unique within the device.
    pub name: String,
    /// Direction.
    pub kind: PinKind,
    /// Expression text defining the intended state (output pins only).
    pub expression: Option<String>,
}

impl Pin {
    /// Whether this pin participates in intended-state computation.
    #[must_use]
    pub fn has_intended_state(&self) -> bool {
        self.kind == PinKind::Output && self.expression.is_some()
    }
}

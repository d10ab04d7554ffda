//! Input trigger — an edge → expression rule on an input pin.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which transition of an input pin a trigger reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// Transition to high (1).
    Rising,
    /// Transition to low (0).
    Falling,
    /// Either transition.
    Both,
}

impl Edge {
    /// The edge represented by a reported pin level.
    #[must_use]
    pub fn from_level(level: bool) -> Self {
        if level { Self::Rising } else { Self::Falling }
    }

    /// Whether a trigger configured with this edge fires for `event`.
    ///
    /// `Both` matches every event edge.
    #[must_use]
    pub fn matches(self, event: Edge) -> bool {
        self == Self::Both || self == event
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rising => f.write_str("rising"),
            Self::Falling => f.write_str("falling"),
            Self::Both => f.write_str("both"),
        }
    }
}

/// Parse failure for [`Edge`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown edge: {0:?}")]
pub struct ParseEdgeError(pub String);

impl FromStr for Edge {
    type Err = ParseEdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rising" => Ok(Self::Rising),
            "falling" => Ok(Self::Falling),
            "both" => Ok(Self::Both),
            other => Err(ParseEdgeError(other.to_string())),
        }
    }
}

/// A rule that runs an expression when its input pin sees a matching edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTrigger {
    /// Device owning the input pin.
    pub device: String,
    /// Name of the input pin.
    pub pin: String,
    /// Edge this trigger reacts to.
    pub edge: Edge,
    /// Expression executed when the trigger fires.
    pub expression: String,
}

//! Dispatch actions and the port used to submit them.
//!
//! Actions are serializable so they can cross the local datagram channel
//! between the web-facing process and the dispatch process.

use std::future::Future;

use serde::{Deserialize, Serialize};

use pinhub_domain::error::HubError;

/// One instruction for the dispatch subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// GET `path` on the device's current address, keeping the
    /// connection alive for subsequent requests.
    Request { device: String, path: String },

    /// Tear down the connection actor for the device's current address.
    /// Requests already queued on it are delivered first.
    ClearDevice { device: String },
}

impl Action {
    /// A request driving an output pin to `value`.
    ///
    /// Devices expose `GET /<pinName>/<0|1>`.
    #[must_use]
    pub fn set_pin(device: impl Into<String>, pin: &str, value: bool) -> Self {
        Self::Request {
            device: device.into(),
            path: format!("/{pin}/{}", u8::from(value)),
        }
    }

    /// The device this action targets.
    #[must_use]
    pub fn device(&self) -> &str {
        match self {
            Self::Request { device, .. } | Self::ClearDevice { device } => device,
        }
    }
}

/// The dispatch queue is gone; the action cannot be delivered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dispatch channel closed")]
pub struct ChannelClosed;

impl From<ChannelClosed> for HubError {
    fn from(err: ChannelClosed) -> Self {
        Self::Channel(Box::new(err))
    }
}

/// Submit actions to the dispatch subsystem.
///
/// Submission is queueing only — it never waits on network IO, so a slow
/// device cannot stall the caller.
pub trait ActionSender: Send + Sync {
    /// Enqueue one action.
    fn send(&self, action: Action) -> impl Future<Output = Result<(), HubError>> + Send;
}

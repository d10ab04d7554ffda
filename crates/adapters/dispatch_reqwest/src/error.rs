//! Errors surfaced to the dispatch error hook.

use pinhub_domain::error::HubError;

use crate::transport::TransportError;

/// Why a dispatch action could not be completed.
///
/// These never propagate to the submitter; they are handed to the
/// configured [`DispatchHooks`](crate::hooks::DispatchHooks) and logged.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The device answered with a non-2xx status; not retried.
    #[error("bad response: {status}")]
    BadResponse { status: u16 },

    /// The transport kept failing after every retry.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The device has no record in the store.
    #[error("unknown device {0:?}")]
    UnknownDevice(String),

    /// The address lookup itself failed.
    #[error("address lookup failed")]
    Resolve(#[source] HubError),
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::BadResponse { status } => Self::BadResponse { status },
            TransportError::Failed(source) => Self::Transport(source),
        }
    }
}

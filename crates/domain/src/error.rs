//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! via `#[from]` or explicit boxing; no stringly-typed variants.

/// Top-level error for all hub operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The state store failed; the enclosing transaction rolled back.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The dispatch action channel is unavailable.
    #[error("dispatch channel error")]
    Channel(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A name field was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A device network port was zero.
    #[error("network port must be non-zero")]
    ZeroPort,

    /// A device report carried no address and none could be inferred.
    #[error("device report carries no ip address")]
    MissingAddress,
}

/// A lookup by unique key found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {key}")]
pub struct NotFoundError {
    /// The kind of record, e.g. `"Device"`.
    pub entity: &'static str,
    /// The key that was looked up.
    pub key: String,
}

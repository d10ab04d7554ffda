//! Storage-specific error type wrapping sqlx errors.

use pinhub_domain::error::HubError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// A stored enum column held a value the domain does not know.
    #[error("corrupt column value")]
    Corrupt(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for HubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

//! # pinhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the state store port defined in `pinhub-app::ports::store`
//! - Manage the `SQLite` connection pool lifecycle
//! - Run database migrations (sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `pinhub-app` (for port traits) and `pinhub-domain` (for
//! domain types). The `app` and `domain` crates must never reference
//! this adapter.

pub mod error;
pub mod pool;
pub mod store;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use store::SqliteStateStore;

//! # pinhub-adapter-http-axum
//!
//! HTTP adapter using [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Ingest device reports (`POST /device/status`) and hand them to the
//!   evaluation pipeline, then submit the resulting dispatch actions in
//!   order
//! - Serve the small JSON API (devices, variables, logs) and the
//!   liveness probe
//! - Map domain errors to HTTP status codes
//!
//! ## Dependency rule
//! Depends on `pinhub-app` (for the engine and ports) and
//! `pinhub-domain`. The `app` and `domain` crates must never reference
//! this adapter.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

//! # pinhub-adapter-dispatch-reqwest
//!
//! The dispatch subsystem: delivers pin-set requests to devices without
//! blocking the caller and without one unreachable device affecting the
//! rest of the fleet.
//!
//! ## Responsibilities
//! - Consume [`Action`](pinhub_app::ports::Action)s from an unbounded
//!   in-process queue (and optionally from a local datagram socket)
//! - Keep one **connection actor** per device network address: a worker
//!   task owning a keep-alive HTTP connection and a FIFO queue
//! - Retry transport failures with a small bounded budget; surface bad
//!   responses immediately
//! - Tear actors down in order on device logout (`ClearDevice`)
//! - Forward every failure to hooks that append error log entries; a
//!   dispatch failure never reaches the submitter
//!
//! ## Dependency rule
//! Depends on `pinhub-app` (for ports) and `pinhub-domain`. The engine
//! never imports this crate; `pinhubd` wires the two together.

pub mod actor;
#[cfg(unix)]
pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod hooks;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(unix)]
pub use channel::{ChannelSender, ChannelServer};
pub use dispatcher::{DispatchConfig, Dispatcher, DispatcherHandle, spawn, spawn_with};
pub use error::DispatchError;
pub use hooks::{DispatchHooks, LoggingHooks};
pub use transport::{Connection, Connector, ReqwestConnector, TransportError};

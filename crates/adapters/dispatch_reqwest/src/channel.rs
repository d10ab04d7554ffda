//! Local action channel — a Unix datagram socket carrying serialized
//! actions.
//!
//! Lets an out-of-process web frontend hand actions to the dispatch
//! process without ever blocking on device IO. Delivery is at-least-once
//! and unordered across senders; the payload is one JSON-encoded
//! [`Action`] per datagram.

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tokio::net::UnixDatagram;

use pinhub_app::ports::{Action, ActionSender};
use pinhub_domain::error::HubError;

/// Largest datagram the server accepts.
const MAX_DATAGRAM: usize = 64 * 1024;

/// Receives actions from the socket and forwards them into a local
/// [`ActionSender`] (normally the dispatcher handle).
pub struct ChannelServer<S> {
    socket: UnixDatagram,
    sender: S,
}

impl<S: ActionSender> ChannelServer<S> {
    /// Bind the socket, replacing any stale file from a previous run,
    /// and restrict it to owner-only access.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`io::Error`] when binding or adjusting
    /// permissions fails.
    pub fn bind(path: impl AsRef<Path>, sender: S) -> io::Result<Self> {
        let path = path.as_ref();
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        let socket = UnixDatagram::bind(path)?;
        let mut permissions = std::fs::metadata(path)?.permissions();
        permissions.set_mode(0o600);
        std::fs::set_permissions(path, permissions)?;
        tracing::info!(path = %path.display(), "action channel listening");
        Ok(Self { socket, sender })
    }

    /// Receive loop; runs until the forwarding sender is gone.
    ///
    /// Malformed datagrams are logged and discarded — a bad client must
    /// not take the channel down.
    pub async fn run(self) {
        let mut buffer = vec![0_u8; MAX_DATAGRAM];
        loop {
            let len = match self.socket.recv(&mut buffer).await {
                Ok(len) => len,
                Err(err) => {
                    tracing::error!(error = %err, "action channel receive failed");
                    continue;
                }
            };
            match serde_json::from_slice::<Action>(&buffer[..len]) {
                Ok(action) => {
                    if self.sender.send(action).await.is_err() {
                        tracing::info!("dispatcher gone, closing action channel");
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "discarding malformed action datagram");
                }
            }
        }
    }
}

/// Submits actions to a dispatch process listening on a channel socket.
pub struct ChannelSender {
    socket: UnixDatagram,
    target: PathBuf,
}

impl ChannelSender {
    /// Create a sender towards the server socket at `target`.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`io::Error`] when the local socket
    /// cannot be created.
    pub fn new(target: impl Into<PathBuf>) -> io::Result<Self> {
        Ok(Self {
            socket: UnixDatagram::unbound()?,
            target: target.into(),
        })
    }
}

impl ActionSender for ChannelSender {
    async fn send(&self, action: Action) -> Result<(), HubError> {
        let payload =
            serde_json::to_vec(&action).map_err(|err| HubError::Channel(Box::new(err)))?;
        self.socket
            .send_to(&payload, &self.target)
            .await
            .map_err(|err| HubError::Channel(Box::new(err)))?;
        Ok(())
    }
}

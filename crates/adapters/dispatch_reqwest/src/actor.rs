//! Per-address connection actor.
//!
//! One worker task per device network address. The worker owns one
//! keep-alive connection and drains a FIFO command queue, executing
//! requests strictly in submission order. Teardown queues a shutdown
//! command behind any pending sends and waits for the worker to exit,
//! so queued requests are still delivered first.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::DispatchError;
use crate::hooks::DispatchHooks;
use crate::transport::{Connection, Connector, TransportError};

/// How many times a transport failure is retried on a fresh connection.
const RETRIES: u8 = 2;

enum Command {
    Send { device: String, path: String },
    Shutdown,
}

/// Handle to one address's worker task.
pub(crate) struct ConnectionActor {
    queue: mpsc::UnboundedSender<Command>,
    worker: JoinHandle<()>,
}

impl ConnectionActor {
    /// Start the worker for `host:port`.
    pub(crate) fn spawn<C, H>(connector: Arc<C>, host: String, port: u16, hooks: Arc<H>) -> Self
    where
        C: Connector,
        H: DispatchHooks,
    {
        let (queue, commands) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(connector, host, port, hooks, commands));
        Self { queue, worker }
    }

    /// Enqueue one request. Returns `false` when the worker is gone and
    /// the actor must be respawned.
    pub(crate) fn send(&self, device: &str, path: &str) -> bool {
        self.queue
            .send(Command::Send {
                device: device.to_string(),
                path: path.to_string(),
            })
            .is_ok()
    }

    /// Queue a shutdown behind pending sends and wait for the worker to
    /// drain the queue, close its connection and exit.
    pub(crate) async fn teardown(self) {
        let _ = self.queue.send(Command::Shutdown);
        drop(self.queue);
        let _ = self.worker.await;
    }
}

async fn run_worker<C, H>(
    connector: Arc<C>,
    host: String,
    port: u16,
    hooks: Arc<H>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) where
    C: Connector,
    H: DispatchHooks,
{
    tracing::debug!(host, port, "connection worker started");
    let mut connection: Option<C::Conn> = None;

    while let Some(command) = commands.recv().await {
        match command {
            Command::Send { device, path } => {
                match execute(connector.as_ref(), &host, port, &mut connection, &path).await {
                    Ok(body) => hooks.on_response(&device, &body).await,
                    Err(err) => hooks.on_error(&device, &DispatchError::from(err)).await,
                }
            }
            Command::Shutdown => break,
        }
    }

    // Dropping the connection closes it.
    tracing::debug!(host, port, "connection worker stopped");
}

/// Issue one request, reopening the connection on transport failures up
/// to the retry budget. A non-2xx response is surfaced immediately.
async fn execute<C: Connector>(
    connector: &C,
    host: &str,
    port: u16,
    connection: &mut Option<C::Conn>,
    path: &str,
) -> Result<String, TransportError> {
    let mut retries = RETRIES;
    loop {
        let conn = match connection {
            Some(conn) => conn,
            None => match connector.open(host, port) {
                Ok(conn) => connection.insert(conn),
                Err(err) => {
                    if retries == 0 {
                        return Err(err);
                    }
                    retries -= 1;
                    continue;
                }
            },
        };

        match conn.get(path).await {
            Ok(body) => return Ok(body),
            Err(err @ TransportError::BadResponse { .. }) => {
                *connection = None;
                return Err(err);
            }
            Err(err) => {
                *connection = None;
                if retries == 0 {
                    return Err(err);
                }
                retries -= 1;
            }
        }
    }
}

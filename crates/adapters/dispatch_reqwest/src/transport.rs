//! The connection capability behind every actor.
//!
//! Actors never talk to reqwest directly; they go through the
//! [`Connector`]/[`Connection`] pair so tests can drive them with
//! scripted transports.

use std::future::Future;
use std::time::Duration;

/// Outcome of one HTTP exchange attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device answered with a non-2xx status.
    #[error("bad response: {status}")]
    BadResponse { status: u16 },

    /// The exchange failed below the HTTP layer (timeout, reset, refused).
    /// Eligible for retry on a fresh connection.
    #[error("transport failure")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// One keep-alive connection to a device address.
pub trait Connection: Send {
    /// Issue `GET path` and return the response body.
    fn get(&mut self, path: &str)
    -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// Opens connections to device addresses.
pub trait Connector: Send + Sync + 'static {
    /// The connection type this connector produces.
    type Conn: Connection + 'static;

    /// Open a connection to `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Failed`] when the transport cannot be
    /// set up; the actor counts that against its retry budget.
    fn open(&self, host: &str, port: u16) -> Result<Self::Conn, TransportError>;
}

/// Production connector: one reqwest client per device address.
pub struct ReqwestConnector {
    timeout: Duration,
}

impl ReqwestConnector {
    /// Create a connector whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Connector for ReqwestConnector {
    type Conn = ReqwestConnection;

    fn open(&self, host: &str, port: u16) -> Result<ReqwestConnection, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| TransportError::Failed(Box::new(err)))?;
        Ok(ReqwestConnection {
            client,
            base: format!("http://{host}:{port}"),
        })
    }
}

/// A keep-alive HTTP connection to one device.
pub struct ReqwestConnection {
    client: reqwest::Client,
    base: String,
}

impl Connection for ReqwestConnection {
    async fn get(&mut self, path: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base))
            .header(reqwest::header::CONNECTION, "keep-alive")
            .send()
            .await
            .map_err(|err| TransportError::Failed(Box::new(err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::BadResponse {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|err| TransportError::Failed(Box::new(err)))
    }
}

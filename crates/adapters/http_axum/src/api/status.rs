//! Device report ingestion.
//!
//! `POST /device/status` is the one endpoint devices talk to. The body
//! is parsed into a [`DeviceReport`], run through the evaluation
//! pipeline in one pass, and the resulting dispatch actions are
//! submitted in order. The response body is empty; device firmware only
//! checks the status code.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use pinhub_app::ports::{ActionSender, StateStore};
use pinhub_domain::report::DeviceReport;

use crate::error::ApiError;
use crate::state::AppState;

/// The reporting device's peer address, when the server was started
/// with connect-info (router tests drive requests without it).
pub struct PeerAddr(pub Option<SocketAddr>);

impl<S: Send + Sync> FromRequestParts<S> for PeerAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

/// Possible responses from the report endpoint.
pub enum ReportResponse {
    Accepted,
}

impl IntoResponse for ReportResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => (StatusCode::OK, "").into_response(),
        }
    }
}

/// `POST /device/status`
pub async fn report<S, A>(
    State(state): State<AppState<S, A>>,
    PeerAddr(peer): PeerAddr,
    Json(mut report): Json<DeviceReport>,
) -> Result<ReportResponse, ApiError>
where
    S: StateStore + 'static,
    A: ActionSender + 'static,
{
    // Old firmware omits its own ip; the peer address fills in.
    if report.device.ip.is_none() {
        report.device.ip = peer.map(|addr| addr.ip().to_string());
    }

    let actions = state.engine.process_report(report).await?;
    for action in actions {
        state.sender.send(action).await?;
    }
    Ok(ReportResponse::Accepted)
}

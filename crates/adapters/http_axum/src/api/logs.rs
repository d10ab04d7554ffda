//! JSON REST handlers for the audit trail.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use pinhub_app::ports::{ActionSender, StateStore};
use pinhub_domain::log::LogEntry;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 100;

/// Query parameters of the log listing.
#[derive(Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<LogEntry>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/logs?limit=N` — recent entries, newest first.
pub async fn list<S, A>(
    State(state): State<AppState<S, A>>,
    Query(query): Query<LogsQuery>,
) -> Result<ListResponse, ApiError>
where
    S: StateStore + 'static,
    A: ActionSender + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let logs = state.store.recent_logs(limit).await?;
    Ok(ListResponse::Ok(Json(logs)))
}

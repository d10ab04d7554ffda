//! JSON REST handlers for variables.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use pinhub_app::ports::{ActionSender, StateStore};
use pinhub_domain::error::ValidationError;
use pinhub_domain::variable::Variable;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for setting a variable.
#[derive(Deserialize)]
pub struct PutVariableRequest {
    pub value: i64,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Variable>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the put endpoint.
pub enum PutResponse {
    Ok(Json<Variable>),
}

impl IntoResponse for PutResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => (StatusCode::OK, json).into_response(),
        }
    }
}

/// `GET /api/variables`
pub async fn list<S, A>(State(state): State<AppState<S, A>>) -> Result<ListResponse, ApiError>
where
    S: StateStore + 'static,
    A: ActionSender + 'static,
{
    let variables = state.store.list_variables().await?;
    Ok(ListResponse::Ok(Json(variables)))
}

/// `PUT /api/variables/{name}` — create or overwrite a variable.
pub async fn put<S, A>(
    State(state): State<AppState<S, A>>,
    Path(name): Path<String>,
    Json(req): Json<PutVariableRequest>,
) -> Result<PutResponse, ApiError>
where
    S: StateStore + 'static,
    A: ActionSender + 'static,
{
    if name.is_empty() {
        return Err(ApiError::from(ValidationError::EmptyName.into()));
    }
    let variable = state.store.upsert_variable(&name, req.value).await?;
    Ok(PutResponse::Ok(Json(variable)))
}

//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod logs;
#[allow(clippy::missing_errors_doc)]
pub mod status;
#[allow(clippy::missing_errors_doc)]
pub mod variables;

use axum::Router;
use axum::routing::{get, put};

use pinhub_app::ports::{ActionSender, StateStore};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S, A>() -> Router<AppState<S, A>>
where
    S: StateStore + 'static,
    A: ActionSender + 'static,
{
    Router::new()
        .route("/devices", get(devices::list::<S, A>))
        .route("/devices/{name}", get(devices::get::<S, A>))
        .route("/variables", get(variables::list::<S, A>))
        .route("/variables/{name}", put(variables::put::<S, A>))
        .route("/logs", get(logs::list::<S, A>))
}

//! JSON REST handlers for devices.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use pinhub_app::ports::{ActionSender, StateStore};
use pinhub_domain::device::Device;
use pinhub_domain::error::NotFoundError;
use pinhub_domain::time::Timestamp;

use crate::error::ApiError;
use crate::state::AppState;

/// One device with its derived aliveness.
#[derive(Serialize)]
pub struct DeviceSummary {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub version: u32,
    pub last_seen: Timestamp,
    pub alive: bool,
}

impl DeviceSummary {
    fn from_device(device: Device, now: Timestamp, heartbeat_timeout: std::time::Duration) -> Self {
        Self {
            alive: device.is_alive(now, heartbeat_timeout),
            name: device.name,
            host: device.host,
            port: device.port,
            version: device.version,
            last_seen: device.last_seen,
        }
    }
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<DeviceSummary>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<DeviceSummary>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list<S, A>(State(state): State<AppState<S, A>>) -> Result<ListResponse, ApiError>
where
    S: StateStore + 'static,
    A: ActionSender + 'static,
{
    let now = pinhub_domain::time::now();
    let devices = state
        .store
        .list_devices()
        .await?
        .into_iter()
        .map(|device| DeviceSummary::from_device(device, now, state.heartbeat_timeout))
        .collect();
    Ok(ListResponse::Ok(Json(devices)))
}

/// `GET /api/devices/{name}`
pub async fn get<S, A>(
    State(state): State<AppState<S, A>>,
    Path(name): Path<String>,
) -> Result<GetResponse, ApiError>
where
    S: StateStore + 'static,
    A: ActionSender + 'static,
{
    let device = state.store.find_device(&name).await?.ok_or_else(|| {
        ApiError::from(
            NotFoundError {
                entity: "Device",
                key: name,
            }
            .into(),
        )
    })?;
    let now = pinhub_domain::time::now();
    Ok(GetResponse::Ok(Json(DeviceSummary::from_device(
        device,
        now,
        state.heartbeat_timeout,
    ))))
}

//! Axum router assembly.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use pinhub_app::ports::{ActionSender, StateStore};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the device ingestion endpoint at `/device/status`, the JSON
/// API under `/api`, and a liveness probe. Includes a [`TraceLayer`]
/// that logs each HTTP request/response at the `DEBUG` level using the
/// `tracing` ecosystem.
pub fn build<S, A>(state: AppState<S, A>) -> Router
where
    S: StateStore + 'static,
    A: ActionSender + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/device/status", post(crate::api::status::report::<S, A>))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CollectingSender, MemoryStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use pinhub_app::engine::{Engine, EngineConfig};
    use pinhub_app::ports::Action;
    use pinhub_domain::log::{LogEntry, Severity};
    use tower::ServiceExt;

    fn app(store: &MemoryStore, sender: &CollectingSender) -> Router {
        let config = EngineConfig::default();
        let state = AppState::new(
            Engine::new(store.clone(), config.clone()),
            store.clone(),
            sender.clone(),
            config.heartbeat_timeout,
        );
        build(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_report(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/device/status")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let store = MemoryStore::default();
        let sender = CollectingSender::default();

        let response = app(&store, &sender)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_register_device_from_first_report() {
        let store = MemoryStore::default();
        let sender = CollectingSender::default();

        let response = app(&store, &sender)
            .oneshot(post_report(
                r#"{"device": {"name": "porch", "ip": "10.0.0.3", "port": 8080},
                    "pins": [{"name": "button", "type": "input", "value": 0}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
        let device = store.device("porch").unwrap();
        assert_eq!(device.host, "10.0.0.3");
        assert!(sender.actions().is_empty());
    }

    #[tokio::test]
    async fn should_submit_correction_for_drifted_pin() {
        let store = MemoryStore::default();
        let sender = CollectingSender::default();
        store.seed_device("porch", pinhub_domain::time::now());
        store.seed_output_pin("porch", "relay", "True");

        let response = app(&store, &sender)
            .oneshot(post_report(
                r#"{"device": {"name": "porch", "ip": "10.0.0.3", "port": 8080},
                    "pins": [{"name": "relay", "type": "output", "value": 0}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sender.actions(), vec![Action::set_pin("porch", "relay", true)]);
        assert!(
            store
                .logs()
                .iter()
                .any(|entry| entry.severity == Severity::Warning)
        );
    }

    #[tokio::test]
    async fn should_reject_report_without_any_address() {
        let store = MemoryStore::default();
        let sender = CollectingSender::default();

        // No ip in the body and no peer info on the oneshot request.
        let response = app(&store, &sender)
            .oneshot(post_report(
                r#"{"device": {"name": "porch", "port": 8080}, "pins": []}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_list_devices_with_aliveness() {
        let store = MemoryStore::default();
        let sender = CollectingSender::default();
        let now = pinhub_domain::time::now();
        store.seed_device("fresh", now);
        store.seed_device("stale", now - chrono::Duration::hours(1));

        let response = app(&store, &sender)
            .oneshot(
                Request::builder()
                    .uri("/api/devices")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let devices = body.as_array().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0]["name"], "fresh");
        assert_eq!(devices[0]["alive"], true);
        assert_eq!(devices[1]["name"], "stale");
        assert_eq!(devices[1]["alive"], false);
    }

    #[tokio::test]
    async fn should_return_device_detail_by_name() {
        let store = MemoryStore::default();
        let sender = CollectingSender::default();
        store.seed_device("porch", pinhub_domain::time::now());

        let response = app(&store, &sender)
            .oneshot(
                Request::builder()
                    .uri("/api/devices/porch")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "porch");
        assert_eq!(body["host"], "10.0.0.7");
        assert_eq!(body["alive"], true);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_device() {
        let store = MemoryStore::default();
        let sender = CollectingSender::default();

        let response = app(&store, &sender)
            .oneshot(
                Request::builder()
                    .uri("/api/devices/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Device not found: ghost");
    }

    #[tokio::test]
    async fn should_upsert_and_list_variables() {
        let store = MemoryStore::default();
        let sender = CollectingSender::default();
        let app = app(&store, &sender);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/variables/mode")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"value": 3}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "mode");
        assert_eq!(body["value"], 3);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/variables")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["value"], 3);
    }

    #[tokio::test]
    async fn should_list_recent_logs_newest_first() {
        let store = MemoryStore::default();
        let sender = CollectingSender::default();
        for i in 0..4 {
            store.seed_log(LogEntry::new(Severity::Info, format!("entry {i}")));
        }

        let response = app(&store, &sender)
            .oneshot(
                Request::builder()
                    .uri("/api/logs?limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let messages: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["message"].as_str().unwrap())
            .collect();
        assert_eq!(messages, vec!["entry 3", "entry 2"]);
    }
}

//! End-to-end smoke tests for the full pinhubd stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real
//! store, real engine, real axum router) and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot` — no TCP port is bound. Dispatch actions
//! are captured by an in-test sender instead of going out to devices.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use pinhub_adapter_http_axum::router;
use pinhub_adapter_http_axum::state::AppState;
use pinhub_adapter_storage_sqlite_sqlx::{Config, SqliteStateStore};
use pinhub_app::engine::{Engine, EngineConfig};
use pinhub_app::ports::{Action, ActionSender, LogSink};
use pinhub_domain::error::HubError;
use pinhub_domain::trigger::{Edge, InputTrigger};

/// Captures submitted dispatch actions instead of hitting the network.
#[derive(Default, Clone)]
struct CollectingSender {
    actions: Arc<Mutex<Vec<Action>>>,
}

impl CollectingSender {
    fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.actions.lock().unwrap().clear();
    }
}

impl ActionSender for CollectingSender {
    async fn send(&self, action: Action) -> Result<(), HubError> {
        self.actions.lock().unwrap().push(action);
        Ok(())
    }
}

/// Build a fully-wired router backed by an in-memory `SQLite` database.
async fn app() -> (axum::Router, SqliteStateStore, CollectingSender) {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");

    let store = SqliteStateStore::new(db.pool().clone());
    let sender = CollectingSender::default();
    let config = EngineConfig::default();

    let state = AppState::new(
        Engine::new(store.clone(), config.clone()),
        store.clone(),
        sender.clone(),
        config.heartbeat_timeout,
    );

    (router::build(state), store, sender)
}

async fn post_json(app: &axum::Router, method: &str, uri: &str, body: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

async fn get_json(app: &axum::Router, uri: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let (app, _store, _sender) = app().await;

    let response = app
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
async fn should_propagate_trigger_effects_to_other_devices() {
    let (app, store, sender) = app().await;

    // The lamp device logs in with one output pin.
    let status = post_json(
        &app,
        "POST",
        "/device/status",
        r#"{"device": {"name": "D2", "ip": "10.0.0.2", "port": 8080},
            "pins": [{"name": "P2", "type": "output", "value": 0}],
            "type": "login"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The button device reports its input pin.
    let status = post_json(
        &app,
        "POST",
        "/device/status",
        r#"{"device": {"name": "D1", "ip": "10.0.0.1", "port": 8080},
            "pins": [{"name": "P1", "type": "input", "value": 0}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Wire the rule: the lamp follows V, the button sets V.
    let status = post_json(&app, "PUT", "/api/variables/V", r#"{"value": 0}"#).await;
    assert_eq!(status, StatusCode::OK);
    store
        .set_pin_expression("D2", "P2", Some("variable.get('V')"))
        .await
        .unwrap();
    store
        .add_trigger(&InputTrigger {
            device: "D1".to_string(),
            pin: "P1".to_string(),
            edge: Edge::Both,
            expression: "variable.set('V', 1)".to_string(),
        })
        .await
        .unwrap();
    sender.clear();

    // The button fires.
    let status = post_json(
        &app,
        "POST",
        "/device/status",
        r#"{"device": {"name": "D1", "ip": "10.0.0.1", "port": 8080},
            "pins": [{"name": "P1", "type": "input", "value": 1}],
            "type": "event"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(sender.actions(), vec![Action::set_pin("D2", "P2", true)]);

    let variables = get_json(&app, "/api/variables").await;
    assert_eq!(variables.as_array().unwrap().len(), 1);
    assert_eq!(variables[0]["name"], "V");
    assert_eq!(variables[0]["value"], 1);

    let devices = get_json(&app, "/api/devices").await;
    assert_eq!(devices.as_array().unwrap().len(), 2);
    assert!(devices.as_array().unwrap().iter().all(|d| d["alive"] == true));
}

#[tokio::test]
async fn should_correct_drifted_pin_and_log_a_warning() {
    let (app, store, sender) = app().await;

    let status = post_json(
        &app,
        "POST",
        "/device/status",
        r#"{"device": {"name": "porch", "ip": "10.0.0.3", "port": 8080},
            "pins": [{"name": "relay", "type": "output", "value": 1}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    store
        .set_pin_expression("porch", "relay", Some("False"))
        .await
        .unwrap();
    sender.clear();

    // The device still reports the relay high; the hub pushes it low.
    let status = post_json(
        &app,
        "POST",
        "/device/status",
        r#"{"device": {"name": "porch", "ip": "10.0.0.3", "port": 8080},
            "pins": [{"name": "relay", "type": "output", "value": 1}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(sender.actions(), vec![Action::set_pin("porch", "relay", false)]);

    let logs = get_json(&app, "/api/logs?limit=10").await;
    let warning = logs
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["severity"] == "warning")
        .expect("drift warning should be logged");
    assert_eq!(warning["message"], "Wrong value of pin.");
    assert_eq!(warning["device"], "porch");
    assert_eq!(warning["pin"], "relay");
}

#[tokio::test]
async fn should_order_clear_device_before_corrections_on_login() {
    let (app, store, sender) = app().await;

    let status = post_json(
        &app,
        "POST",
        "/device/status",
        r#"{"device": {"name": "gate", "ip": "10.0.0.4", "port": 8080},
            "pins": [{"name": "relay", "type": "output", "value": 1}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    store
        .set_pin_expression("gate", "relay", Some("True"))
        .await
        .unwrap();
    sender.clear();

    // The device reboots and comes back with the relay low.
    let status = post_json(
        &app,
        "POST",
        "/device/status",
        r#"{"device": {"name": "gate", "ip": "10.0.0.4", "port": 8080},
            "pins": [{"name": "relay", "type": "output", "value": 0}],
            "type": "login"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        sender.actions(),
        vec![
            Action::ClearDevice {
                device: "gate".to_string()
            },
            Action::set_pin("gate", "relay", true),
        ]
    );
}

#[tokio::test]
async fn should_log_server_start_marker() {
    // The daemon writes an audit entry on boot; the endpoint surfaces it.
    let (app, store, _sender) = app().await;
    store
        .append_log(&pinhub_domain::log::LogEntry::new(
            pinhub_domain::log::Severity::Info,
            "Server instance started.",
        ))
        .await
        .unwrap();

    let logs = get_json(&app, "/api/logs").await;
    assert_eq!(logs[0]["message"], "Server instance started.");
}

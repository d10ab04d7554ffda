//! # pinhubd — pinhub daemon
//!
//! Composition root that wires all adapters together and starts the
//! server.
//!
//! ## Responsibilities
//! - Parse configuration (`pinhub.toml` + `PINHUB_*` env overrides)
//! - Initialize tracing with the configured filter
//! - Initialize the `SQLite` connection pool and run migrations
//! - Spawn the dispatch subsystem and, optionally, the cross-process
//!   action channel
//! - Build the axum router, injecting the engine and store
//! - Bind to a TCP port and serve with graceful shutdown
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use pinhub_adapter_dispatch_reqwest::{ChannelServer, DispatchConfig, LoggingHooks};
use pinhub_adapter_http_axum::router;
use pinhub_adapter_http_axum::state::AppState;
use pinhub_adapter_storage_sqlite_sqlx::{Config as StorageConfig, SqliteStateStore};
use pinhub_app::engine::{Engine, EngineConfig};
use pinhub_app::ports::LogSink;
use pinhub_domain::log::{LogEntry, Severity};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let store = SqliteStateStore::new(db.pool().clone());

    // Evaluation pipeline
    let engine = Engine::new(
        store.clone(),
        EngineConfig {
            heartbeat_timeout: config.heartbeat_timeout(),
        },
    );

    // Dispatch subsystem
    let (dispatcher, dispatcher_task) = pinhub_adapter_dispatch_reqwest::spawn(
        store.clone(),
        LoggingHooks::new(store.clone()),
        &DispatchConfig {
            request_timeout: config.request_timeout(),
        },
    );

    // Optional cross-process action channel
    let channel_task = match &config.dispatch.channel_socket {
        Some(path) => {
            let server = ChannelServer::bind(path, dispatcher.clone())?;
            Some(tokio::spawn(server.run()))
        }
        None => None,
    };

    store
        .append_log(&LogEntry::new(Severity::Info, "Server instance started."))
        .await?;

    // HTTP
    let state = AppState::new(engine, store, dispatcher.clone(), config.heartbeat_timeout());
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "pinhubd listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Let the dispatcher drain queued requests before exiting.
    if let Some(task) = channel_task {
        task.abort();
    }
    drop(dispatcher);
    dispatcher_task.await?;

    Ok(())
}

/// Resolve when the process should shut down (ctrl-c or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

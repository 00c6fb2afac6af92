//! Campus Board server
//!
//! Wires the store, real-time engine, services and HTTP surface together
//! and serves them until a shutdown signal arrives.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use campusboard_api::{AppState, build_app};
use campusboard_core::config::{AppConfig, StoreBackend};
use campusboard_core::error::AppError;
use campusboard_database::{DatabasePool, Stores};
use campusboard_realtime::RealtimeEngine;
use campusboard_service::Services;

#[tokio::main]
async fn main() {
    let env = std::env::var("CAMPUSBOARD_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Campus Board v{}", env!("CARGO_PKG_VERSION"));

    let (stores, db_pool) = match config.database.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            (Stores::memory(), None)
        }
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = DatabasePool::connect(&config.database).await?;

            tracing::info!("Running database migrations...");
            campusboard_database::migration::run_migrations(pool.pool()).await?;

            (Stores::postgres(pool.pool().clone()), Some(pool))
        }
    };

    let realtime = Arc::new(RealtimeEngine::new(config.realtime.clone()));
    let services = Services::new(&stores, realtime.emitter.clone(), &config.notifications);

    let addr = config.server.bind_address();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds.max(1));
    let state = AppState::new(config, db_pool.clone(), Arc::clone(&realtime), services);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("Campus Board listening on {}", addr);

    let engine = Arc::clone(&realtime);
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            engine.shutdown();
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        biased;
        result = &mut server => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        _ = signalled_rx => {
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => {
                    result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
                }
                Err(_) => tracing::warn!(
                    grace_seconds = grace.as_secs(),
                    "In-flight requests did not finish in time"
                ),
            }
        }
    }

    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("Campus Board shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::sqlite::SqlitePoolOptions;
use tinylink::{
    config::{AppConfig, StorageBackend},
    generator::ThreadRngGenerator,
    recorder::AccessRecorder,
    service::MappingService,
    storage::{MemoryStore, SqliteStore, Storage},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long queued access-count increments get to finish after shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (ignore error if file is absent, env vars may already be set)
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tinylink=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env()?;
    tracing::info!("Starting tinylink on {}:{}", config.host, config.port);
    tracing::info!("Base URL: {}", config.base_url);

    let store = open_store(&config).await?;

    let (recorder, recorder_task) = AccessRecorder::spawn(
        store.clone(),
        config.increment_timeout,
        config.increment_queue_capacity,
    );
    let service = MappingService::new(store, Arc::new(ThreadRngGenerator), recorder);

    let bind_addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState { service, config });
    let app = tinylink::router(state);

    // ── Serve ──────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last recorder handle; the worker now finishes what
    // is queued and exits.
    match tokio::time::timeout(DRAIN_TIMEOUT, recorder_task).await {
        Ok(Ok(())) => tracing::info!("Access counts flushed"),
        Ok(Err(e)) => tracing::error!("Access recorder failed: {}", e),
        Err(_) => tracing::warn!(
            "Access recorder still busy after {:?}, exiting anyway",
            DRAIN_TIMEOUT
        ),
    }

    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::Sqlite => {
            // CREATE the file if it doesn't exist yet
            let pool = SqlitePoolOptions::new()
                .max_connections(10)
                .connect_with(
                    config
                        .database_url
                        .parse::<sqlx::sqlite::SqliteConnectOptions>()?
                        .create_if_missing(true)
                        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal),
                )
                .await
                .context("failed to open the SQLite database")?;

            let store = SqliteStore::new(pool);
            store.migrate().await?;
            tracing::info!("Database migrations applied");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; mappings are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections...");
}

//! notekeeper HTTP service.
//!
//! Wires the PostgreSQL store, the OpenAI-compatible model backend, the note
//! processor worker pool and the retriever behind a small axum router.

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notekeeper_core::CoreConfig;
use notekeeper_db::{log_pool_metrics, Database, PoolConfig};
use notekeeper_inference::{Classifier, Embedder, FsFileReader, OpenAIBackend, OpenAIConfig};
use notekeeper_jobs::{EventWorker, NoteProcessor, WorkerConfig};
use notekeeper_search::{Retriever, RetrieverConfig};

use crate::handlers::AppState;

/// Install the tracing subscriber.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables daily-rolled file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "notekeeper=info,tower_http=info")
///
/// The returned guard must be held for the process lifetime when file
/// logging is enabled.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "notekeeper_api=info,notekeeper_jobs=info,notekeeper_inference=info,notekeeper_search=info,notekeeper_db=info,tower_http=info".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("notekeeper-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let config = CoreConfig::from_env();
    config.validate()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/notekeeper".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let worker_config = WorkerConfig::from_env();

    // Database
    let pool_config = PoolConfig::from_env().for_worker_shards(worker_config.shards);
    let db = Database::connect_with_config(&database_url, pool_config).await?;
    db.migrate().await?;
    info!("Database connected and migrated");

    // Model clients
    let backend = Arc::new(OpenAIBackend::new(OpenAIConfig::from_env(&config))?);
    let files = Arc::new(FsFileReader::new(config.storage.upload_dir.clone()));
    let classifier = Arc::new(Classifier::new(
        backend.clone(),
        files,
        config.classifier.clone(),
    ));
    let embedder = Arc::new(Embedder::new(backend.clone()));

    // Note processor worker pool
    let processor = NoteProcessor::from_database(
        &db,
        classifier.clone(),
        embedder.clone(),
        config.processor.clone(),
    );
    info!(
        enabled = worker_config.enabled,
        shards = worker_config.shards,
        queue_capacity = worker_config.queue_capacity,
        resummarize_on_edit = config.processor.resummarize_on_edit,
        "Starting note event worker"
    );
    let (publisher, worker) = EventWorker::new(Arc::new(processor), worker_config).start();
    info!(active_shards = publisher.shard_count(), "Note event worker started");

    let retriever = Retriever::from_database(
        &db,
        embedder,
        classifier,
        RetrieverConfig::from_core(&config),
    );

    let state = AppState {
        publisher,
        retriever: Arc::new(retriever),
        inference: backend,
    };
    let app = handlers::router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Draining note event worker");
    worker.shutdown().await?;
    log_pool_metrics(db.pool());

    Ok(())
}

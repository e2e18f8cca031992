//! Paivand server binary.
//!
//! Starts the axum HTTP server with structured logging, database
//! initialization, translation providers resolved from configuration, and
//! graceful shutdown on SIGTERM/SIGINT.

use paivand_server::{app, config, AppState};
use paivand_translate::{
    AnalyticsRecorder, GoogleProvider, OllamaProvider, TranslationOrchestrator,
    TranslationProvider,
};
use paivand_voice::{DeepgramTranscriber, VoicePipeline};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

/// Capacity of the chat event broadcast channel. A subscriber this far
/// behind starts dropping events and re-syncs over HTTP.
const EVENT_CHANNEL_CAPACITY: usize = 256;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("PAIVAND_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Initialize database
    let pool = paivand_db::create_pool(
        &config.database.path,
        paivand_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool — check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied = paivand_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    // Resolve translation providers once, in configuration order: the local
    // model first, then the fallback. Order is the tie-break order.
    let mut providers: Vec<Arc<dyn TranslationProvider>> = vec![Arc::new(OllamaProvider::new(
        &config.translation.ollama_url,
        &config.translation.ollama_model,
    ))];
    if config.translation.google_fallback {
        providers.push(Arc::new(GoogleProvider::new()));
    }
    tracing::info!(
        providers = providers.len(),
        ollama_url = %config.translation.ollama_url,
        google_fallback = config.translation.google_fallback,
        "resolved translation providers"
    );

    if config.transcription.api_key.is_empty() {
        tracing::warn!("no deepgram API key configured; voice messages will stay audio-only");
    }

    let recorder = AnalyticsRecorder::new(pool.clone());
    let orchestrator = Arc::new(TranslationOrchestrator::new(providers, recorder.clone()));
    let transcriber = Arc::new(DeepgramTranscriber::new(
        config.transcription.clone(),
        &config.media.root,
    ));
    let (events_tx, _events_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let pipeline = VoicePipeline::new(
        pool.clone(),
        Arc::clone(&orchestrator),
        transcriber,
        events_tx.clone(),
    );

    let state = AppState {
        pool,
        orchestrator,
        pipeline,
        recorder,
        events_tx,
    };

    // Build application
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting paivand server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("paivand server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}

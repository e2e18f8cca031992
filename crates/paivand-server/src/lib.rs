//! Paivand server library logic.
//!
//! Wires the translation orchestrator, voice pipeline, message store, and
//! live event stream into one axum application. Handlers are thin: they
//! validate, check a connection out of the pool inside `spawn_blocking`,
//! call into the library crates, and publish events.

pub mod api_analytics;
pub mod api_messages;
pub mod api_presence;
pub mod api_sse;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use paivand_db::DbPool;
use paivand_translate::{AnalyticsRecorder, TranslationOrchestrator};
use paivand_types::ChatEvent;
use paivand_voice::VoicePipeline;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Provider race and candidate selection.
    pub orchestrator: Arc<TranslationOrchestrator>,
    /// Voice message state machine.
    pub pipeline: VoicePipeline,
    /// Provider selection analytics.
    pub recorder: AnalyticsRecorder,
    /// Broadcast channel for live chat events (SSE stream).
    pub events_tx: broadcast::Sender<ChatEvent>,
}

/// Maximum request body size (2 MiB). Media is referenced by path, never
/// carried in the body, so requests stay small.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Best-effort event publication; an empty subscriber set is normal.
pub(crate) fn publish(state: &AppState, event: ChatEvent) {
    if state.events_tx.send(event).is_err() {
        tracing::debug!("no live subscribers for chat event");
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/messages", get(api_messages::list_messages_handler))
        .route(
            "/api/messages/text",
            post(api_messages::create_text_message_handler),
        )
        .route(
            "/api/messages/voice",
            post(api_messages::create_voice_message_handler),
        )
        .route(
            "/api/messages/media",
            post(api_messages::create_media_message_handler),
        )
        .route(
            "/api/messages/{messageId}/reactions",
            post(api_messages::add_reaction_handler),
        )
        .route(
            "/api/persona/activate",
            post(api_presence::activate_persona_handler),
        )
        .route(
            "/api/analytics/translation",
            get(api_analytics::get_translation_stats_handler),
        )
        .route("/events/stream", get(api_sse::get_event_stream_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}

//! Translation analytics API handlers.

use crate::AppState;
use axum::{extract::Extension, http::StatusCode, response::Json};
use paivand_translate::ProviderStat;
use serde::Serialize;
use std::sync::Arc;

/// Response wrapper for provider selection statistics.
#[derive(Serialize)]
pub struct TranslationStatsResponse {
    pub providers: Vec<ProviderStat>,
    pub count: usize,
}

/// Handler for `GET /api/analytics/translation`.
///
/// Returns per-provider selection counts and average latency, ordered by
/// provider name.
pub async fn get_translation_stats_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<TranslationStatsResponse>, StatusCode> {
    let recorder = state.recorder.clone();
    let providers = tokio::task::spawn_blocking(move || recorder.list())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "analytics task join error");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "failed to read translation analytics");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let count = providers.len();
    Ok(Json(TranslationStatsResponse { providers, count }))
}

//! Persona presence API handler.

use crate::{publish, AppState};
use axum::{extract::Extension, response::Json};
use paivand_types::{ChatEvent, PersonaId, PresenceStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivatePersonaRequest {
    pub persona_id: PersonaId,
}

/// Handler for `POST /api/persona/activate`.
///
/// Announces the persona on the live stream so the other side's client can
/// mark them online. Presence is never persisted; a restart forgets it.
pub async fn activate_persona_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ActivatePersonaRequest>,
) -> Json<Value> {
    tracing::debug!(persona_id = payload.persona_id.as_str(), "persona active");
    publish(
        &state,
        ChatEvent::PresenceUpdated {
            persona_id: payload.persona_id,
            status: PresenceStatus::Online,
        },
    );
    Json(json!({ "ok": true }))
}

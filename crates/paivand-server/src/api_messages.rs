//! Message API handlers: listing, text, voice, media, and reactions.

use crate::{publish, AppState};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use paivand_store::{
    add_attachment, add_reaction, create_message, get_message, list_messages, NewMessage,
    StoreError,
};
use paivand_translate::TranslateError;
use paivand_types::{
    Attachment, ChatEvent, Locale, MediaKind, Message, MessageKind, PersonaId, Reaction,
};
use paivand_voice::VoiceMessageParams;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Maximum length for a text message or caption.
const MAX_TEXT_LEN: usize = 4096;
/// Maximum number of attachments on one media message.
const MAX_ATTACHMENTS: usize = 10;
/// Number of prior messages folded into translation context.
const CONTEXT_MESSAGES: u32 = 5;

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Maps a [`StoreError`] to the correct HTTP status code, logging non-404
/// errors.
fn store_err_to_status(e: StoreError) -> StatusCode {
    match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        err => {
            tracing::error!(error = %err, "store operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn pool_err_to_status(e: r2d2::Error) -> StatusCode {
    tracing::error!(error = %e, "failed to get database connection");
    StatusCode::INTERNAL_SERVER_ERROR
}

fn join_err_to_status(e: tokio::task::JoinError) -> StatusCode {
    tracing::error!(error = %e, "blocking task join error");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Derives translation context from the most recent messages: the warmest
/// available rendering of each, most recent first.
pub(crate) fn derive_context(conn: &rusqlite::Connection) -> Result<Vec<String>, StoreError> {
    let recent = list_messages(conn, CONTEXT_MESSAGES, 0)?;
    Ok(recent
        .into_iter()
        .map(|message| {
            message
                .tone_adjusted_text
                .or(message.translated_text)
                .or(message.original_text)
                .unwrap_or_default()
        })
        .collect())
}

async fn load_context(state: &AppState) -> Result<Vec<String>, StatusCode> {
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(pool_err_to_status)?;
        derive_context(&conn).map_err(store_err_to_status)
    })
    .await
    .map_err(join_err_to_status)?
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Maximum number of messages to return (default: 50, max: 200).
    pub limit: Option<u32>,
    /// Number of messages to skip, newest first.
    pub offset: Option<u32>,
}

/// Response wrapper for paginated message retrieval.
#[derive(Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
    pub count: usize,
}

/// Handler for `GET /api/messages`.
///
/// Returns messages newest first, hydrated with attachments and reactions.
pub async fn list_messages_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<MessagesResponse>, StatusCode> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let offset = params.offset.unwrap_or(0);

    let pool = state.pool.clone();
    let messages = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(pool_err_to_status)?;
        list_messages(&conn, limit, offset).map_err(store_err_to_status)
    })
    .await
    .map_err(join_err_to_status)??;

    let count = messages.len();
    Ok(Json(MessagesResponse { messages, count }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTextMessageRequest {
    pub sender_persona_id: PersonaId,
    pub text: String,
}

/// Handler for `POST /api/messages/text`.
///
/// Translates synchronously before persisting; the caller gets the fully
/// translated message or an error. When every provider fails the request
/// answers `502 Bad Gateway` and nothing is stored.
pub async fn create_text_message_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateTextMessageRequest>,
) -> Result<(StatusCode, Json<Message>), StatusCode> {
    let text = payload.text.trim().to_string();
    if text.is_empty() || text.len() > MAX_TEXT_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }

    let context = load_context(&state).await?;
    let direction = payload.sender_persona_id.direction();

    let translation = state
        .orchestrator
        .translate(&text, direction, &context)
        .await
        .map_err(|e| match e {
            TranslateError::NoCandidates => {
                tracing::warn!(?direction, "text message translation unavailable");
                StatusCode::BAD_GATEWAY
            }
        })?;

    let row = NewMessage {
        id: Uuid::new_v4().to_string(),
        sender_persona_id: payload.sender_persona_id,
        original_text: Some(text),
        original_locale: Some(direction.source()),
        translated_text: Some(translation.translated_text),
        translated_locale: Some(translation.locale),
        tone_adjusted_text: Some(translation.tone_adjusted_text),
        translation_provider: Some(translation.provider),
        audio_url: None,
        kind: MessageKind::Text,
        created_at: now_rfc3339(),
    };

    let pool = state.pool.clone();
    let message = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(pool_err_to_status)?;
        create_message(&conn, &row).map_err(store_err_to_status)?;
        get_message(&conn, &row.id)
            .map_err(store_err_to_status)?
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await
    .map_err(join_err_to_status)??;

    publish(&state, ChatEvent::MessageCreated(message.clone()));
    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoiceMessageRequest {
    pub sender_persona_id: PersonaId,
    /// Path or URL of the already-stored audio resource.
    pub audio_url: String,
    /// Spoken locale; defaults to the sender's writing locale.
    pub original_locale: Option<Locale>,
}

/// Handler for `POST /api/messages/voice`.
///
/// Answers `202 Accepted` with the unprocessed placeholder immediately;
/// transcription and translation continue in the background and surface
/// through the event stream.
pub async fn create_voice_message_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateVoiceMessageRequest>,
) -> Result<(StatusCode, Json<Message>), StatusCode> {
    if payload.audio_url.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let context = load_context(&state).await?;
    let params = VoiceMessageParams {
        persona_id: payload.sender_persona_id,
        audio_url: payload.audio_url,
        original_locale: payload
            .original_locale
            .unwrap_or_else(|| payload.sender_persona_id.default_locale()),
        context,
    };

    let pipeline = state.pipeline.clone();
    let placeholder = tokio::task::spawn_blocking(move || pipeline.start(params))
        .await
        .map_err(join_err_to_status)?
        .map_err(|e| {
            tracing::error!(error = %e, "voice placeholder write failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok((StatusCode::ACCEPTED, Json(placeholder)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachmentRequest {
    pub uri: String,
    pub mime_type: String,
    pub media_type: MediaKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaMessageRequest {
    pub sender_persona_id: PersonaId,
    /// Optional caption; stored untranslated.
    #[serde(default)]
    pub caption: Option<String>,
    pub attachments: Vec<MediaAttachmentRequest>,
}

/// Handler for `POST /api/messages/media`.
///
/// Media messages carry attachments plus an optional caption and skip the
/// translation path entirely.
pub async fn create_media_message_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateMediaMessageRequest>,
) -> Result<(StatusCode, Json<Message>), StatusCode> {
    if payload.attachments.is_empty() || payload.attachments.len() > MAX_ATTACHMENTS {
        return Err(StatusCode::BAD_REQUEST);
    }
    if payload
        .attachments
        .iter()
        .any(|a| a.uri.trim().is_empty() || a.mime_type.trim().is_empty())
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    let caption = payload
        .caption
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if caption.as_ref().is_some_and(|c| c.len() > MAX_TEXT_LEN) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let created_at = now_rfc3339();
    let row = NewMessage {
        id: Uuid::new_v4().to_string(),
        sender_persona_id: payload.sender_persona_id,
        original_locale: caption
            .as_ref()
            .map(|_| payload.sender_persona_id.default_locale()),
        original_text: caption,
        translated_text: None,
        translated_locale: None,
        tone_adjusted_text: None,
        translation_provider: None,
        audio_url: None,
        kind: MessageKind::Media,
        created_at: created_at.clone(),
    };

    let attachments: Vec<Attachment> = payload
        .attachments
        .into_iter()
        .map(|a| Attachment {
            id: Uuid::new_v4().to_string(),
            message_id: row.id.clone(),
            uri: a.uri,
            mime_type: a.mime_type,
            media_type: a.media_type,
            created_at: created_at.clone(),
        })
        .collect();

    let pool = state.pool.clone();
    let message = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(pool_err_to_status)?;
        create_message(&conn, &row).map_err(store_err_to_status)?;
        for attachment in &attachments {
            add_attachment(&conn, attachment).map_err(store_err_to_status)?;
        }
        get_message(&conn, &row.id)
            .map_err(store_err_to_status)?
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await
    .map_err(join_err_to_status)??;

    publish(&state, ChatEvent::MessageCreated(message.clone()));
    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReactionRequest {
    pub persona_id: PersonaId,
    pub emoji: String,
}

/// Handler for `POST /api/messages/{messageId}/reactions`.
pub async fn add_reaction_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(message_id): Path<String>,
    Json(payload): Json<AddReactionRequest>,
) -> Result<(StatusCode, Json<Reaction>), StatusCode> {
    let emoji = payload.emoji.trim().to_string();
    if emoji.is_empty() || emoji.len() > 32 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let reaction = Reaction {
        id: Uuid::new_v4().to_string(),
        message_id,
        persona_id: payload.persona_id,
        emoji,
        created_at: now_rfc3339(),
    };

    let pool = state.pool.clone();
    let stored = reaction.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(pool_err_to_status)?;
        let exists = get_message(&conn, &stored.message_id)
            .map_err(store_err_to_status)?
            .is_some();
        if !exists {
            return Err(StatusCode::NOT_FOUND);
        }
        add_reaction(&conn, &stored).map_err(store_err_to_status)
    })
    .await
    .map_err(join_err_to_status)??;

    publish(&state, ChatEvent::ReactionAdded(reaction.clone()));
    Ok((StatusCode::CREATED, Json(reaction)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paivand_db::run_migrations;
    use rusqlite::Connection;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().expect("failed to open in-memory db");
        run_migrations(&conn).expect("failed to run migrations");
        conn
    }

    fn insert(conn: &Connection, id: &str, created_at: &str, tone: Option<&str>, text: &str) {
        let row = NewMessage {
            id: id.to_string(),
            sender_persona_id: PersonaId::Brian,
            original_text: Some(text.to_string()),
            original_locale: Some(Locale::En),
            translated_text: None,
            translated_locale: None,
            tone_adjusted_text: tone.map(str::to_string),
            translation_provider: None,
            audio_url: None,
            kind: MessageKind::Text,
            created_at: created_at.to_string(),
        };
        create_message(conn, &row).expect("insert failed");
    }

    #[test]
    fn context_prefers_the_warmest_rendering() {
        let conn = setup_db();
        insert(&conn, "m-1", "2026-01-01T10:00:00Z", None, "plain original");
        insert(
            &conn,
            "m-2",
            "2026-01-01T11:00:00Z",
            Some("عزیزم سلام ❤️"),
            "ignored",
        );

        let context = derive_context(&conn).expect("derive failed");
        assert_eq!(context, vec!["عزیزم سلام ❤️", "plain original"]);
    }

    #[test]
    fn context_caps_at_five_messages() {
        let conn = setup_db();
        for i in 0..8 {
            insert(
                &conn,
                &format!("m-{i}"),
                &format!("2026-01-01T1{i}:00:00Z"),
                None,
                &format!("line-{i}"),
            );
        }

        let context = derive_context(&conn).expect("derive failed");
        assert_eq!(context.len(), 5);
        assert_eq!(context[0], "line-7");
    }
}

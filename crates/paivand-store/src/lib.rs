//! Message persistence for the paivand chat server.
//!
//! Implements the repository contract the translation and voice cores
//! consume: create/read/list messages, the single-shot voice-fields update
//! applied by the background pipeline, and attachment/reaction inserts.
//!
//! All functions operate on a borrowed [`rusqlite::Connection`]; callers
//! check a connection out of the pool and pass it in. Messages are hydrated
//! with their attachments and reactions on read.

use paivand_types::{Attachment, Locale, MediaKind, Message, MessageKind, PersonaId, Reaction};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

/// Errors that can occur during store operations.
///
/// `Database` is the fatal variant: callers inside the synchronous request
/// path propagate it, the detached voice pipeline logs it and stops.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("message not found: {0}")]
    NotFound(String),
}

/// Column list shared by every message SELECT.
const MESSAGE_COLUMNS: &str = "id, sender_persona_id, original_text, original_locale, \
     translated_text, translated_locale, tone_adjusted_text, translation_provider, \
     audio_url, transcription_text, transcription_confidence, message_type, created_at";

/// A fully-specified message row to insert.
///
/// Attachments are inserted separately via [`add_attachment`]; the row
/// itself carries no attachment data.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: String,
    pub sender_persona_id: PersonaId,
    pub original_text: Option<String>,
    pub original_locale: Option<Locale>,
    pub translated_text: Option<String>,
    pub translated_locale: Option<Locale>,
    pub tone_adjusted_text: Option<String>,
    pub translation_provider: Option<String>,
    pub audio_url: Option<String>,
    pub kind: MessageKind,
    pub created_at: String,
}

/// The voice-pipeline update: transcription plus any translation output.
///
/// Applied as one atomic UPDATE so the stored message never exposes a
/// half-written state to concurrent readers.
#[derive(Debug, Clone, Default)]
pub struct VoiceFieldsUpdate {
    pub original_text: Option<String>,
    pub translated_text: Option<String>,
    pub translated_locale: Option<Locale>,
    pub tone_adjusted_text: Option<String>,
    pub translation_provider: Option<String>,
    pub transcription_text: Option<String>,
    pub transcription_confidence: Option<f64>,
}

/// Inserts a new message row.
pub fn create_message(conn: &Connection, message: &NewMessage) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO messages (
            id, sender_persona_id, original_text, original_locale,
            translated_text, translated_locale, tone_adjusted_text,
            translation_provider, audio_url, transcription_text,
            transcription_confidence, message_type, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, NULL, ?10, ?11)",
        params![
            message.id,
            message.sender_persona_id.as_str(),
            message.original_text,
            message.original_locale.map(Locale::as_str),
            message.translated_text,
            message.translated_locale.map(Locale::as_str),
            message.tone_adjusted_text,
            message.translation_provider,
            message.audio_url,
            message.kind.as_str(),
            message.created_at,
        ],
    )?;
    Ok(())
}

/// Retrieves a message by id, hydrated with attachments and reactions.
///
/// Returns `Ok(None)` if no such message exists.
pub fn get_message(conn: &Connection, id: &str) -> Result<Option<Message>, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
            [id],
            map_row_to_message,
        )
        .optional()?;

    match row {
        Some(mut message) => {
            message.media = list_attachments(conn, &message.id)?;
            message.reactions = list_reactions(conn, &message.id)?;
            Ok(Some(message))
        }
        None => Ok(None),
    }
}

/// Lists messages newest-first with pagination, hydrated with attachments
/// and reactions.
pub fn list_messages(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<Message>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         ORDER BY datetime(created_at) DESC
         LIMIT ?1 OFFSET ?2"
    ))?;

    let rows = stmt.query_map(params![limit, offset], map_row_to_message)?;
    let mut messages = Vec::new();
    for row in rows {
        let mut message = row?;
        message.media = list_attachments(conn, &message.id)?;
        message.reactions = list_reactions(conn, &message.id)?;
        messages.push(message);
    }
    Ok(messages)
}

/// Applies the voice-pipeline update to a message in a single UPDATE.
///
/// Returns `NotFound` if the message does not exist.
pub fn update_voice_fields(
    conn: &Connection,
    id: &str,
    update: &VoiceFieldsUpdate,
) -> Result<(), StoreError> {
    let count = conn.execute(
        "UPDATE messages SET
            original_text = ?1,
            translated_text = ?2,
            translated_locale = ?3,
            tone_adjusted_text = ?4,
            translation_provider = ?5,
            transcription_text = ?6,
            transcription_confidence = ?7
         WHERE id = ?8",
        params![
            update.original_text,
            update.translated_text,
            update.translated_locale.map(Locale::as_str),
            update.tone_adjusted_text,
            update.translation_provider,
            update.transcription_text,
            update.transcription_confidence,
            id,
        ],
    )?;
    if count == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }
    Ok(())
}

/// Inserts an attachment for an existing message.
pub fn add_attachment(conn: &Connection, attachment: &Attachment) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO attachments (id, message_id, uri, mime_type, media_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            attachment.id,
            attachment.message_id,
            attachment.uri,
            attachment.mime_type,
            attachment.media_type.as_str(),
            attachment.created_at,
        ],
    )?;
    Ok(())
}

/// Inserts a reaction for an existing message.
pub fn add_reaction(conn: &Connection, reaction: &Reaction) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO reactions (id, message_id, persona_id, emoji, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            reaction.id,
            reaction.message_id,
            reaction.persona_id.as_str(),
            reaction.emoji,
            reaction.created_at,
        ],
    )?;
    Ok(())
}

/// Lists attachments for a message in insertion order.
pub fn list_attachments(conn: &Connection, message_id: &str) -> Result<Vec<Attachment>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, message_id, uri, mime_type, media_type, created_at
         FROM attachments WHERE message_id = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map([message_id], map_row_to_attachment)?;
    let mut attachments = Vec::new();
    for row in rows {
        attachments.push(row?);
    }
    Ok(attachments)
}

/// Lists reactions for a message in insertion order.
pub fn list_reactions(conn: &Connection, message_id: &str) -> Result<Vec<Reaction>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, message_id, persona_id, emoji, created_at
         FROM reactions WHERE message_id = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map([message_id], map_row_to_reaction)?;
    let mut reactions = Vec::new();
    for row in rows {
        reactions.push(row?);
    }
    Ok(reactions)
}

fn map_row_to_message(row: &Row) -> rusqlite::Result<Message> {
    let persona_str: String = row.get(1)?;
    let sender_persona_id = parse_persona(1, &persona_str)?;

    let original_locale = parse_opt_locale(3, row.get(3)?)?;
    let translated_locale = parse_opt_locale(5, row.get(5)?)?;

    let kind_str: String = row.get(11)?;
    let kind = MessageKind::parse(&kind_str).ok_or_else(|| conversion_error(11, &kind_str))?;

    Ok(Message {
        id: row.get(0)?,
        sender_persona_id,
        original_text: row.get(2)?,
        original_locale,
        translated_text: row.get(4)?,
        translated_locale,
        tone_adjusted_text: row.get(6)?,
        translation_provider: row.get(7)?,
        audio_url: row.get(8)?,
        transcription_text: row.get(9)?,
        transcription_confidence: row.get(10)?,
        kind,
        created_at: row.get(12)?,
        media: Vec::new(),
        reactions: Vec::new(),
    })
}

fn map_row_to_attachment(row: &Row) -> rusqlite::Result<Attachment> {
    let media_str: String = row.get(4)?;
    let media_type = MediaKind::parse(&media_str).ok_or_else(|| conversion_error(4, &media_str))?;
    Ok(Attachment {
        id: row.get(0)?,
        message_id: row.get(1)?,
        uri: row.get(2)?,
        mime_type: row.get(3)?,
        media_type,
        created_at: row.get(5)?,
    })
}

fn map_row_to_reaction(row: &Row) -> rusqlite::Result<Reaction> {
    let persona_str: String = row.get(2)?;
    let persona_id = parse_persona(2, &persona_str)?;
    Ok(Reaction {
        id: row.get(0)?,
        message_id: row.get(1)?,
        persona_id,
        emoji: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn parse_persona(idx: usize, s: &str) -> rusqlite::Result<PersonaId> {
    match s {
        "brian" => Ok(PersonaId::Brian),
        "khadija" => Ok(PersonaId::Khadija),
        other => Err(conversion_error(idx, other)),
    }
}

fn parse_opt_locale(idx: usize, s: Option<String>) -> rusqlite::Result<Option<Locale>> {
    match s {
        None => Ok(None),
        Some(s) => Locale::parse(&s)
            .map(Some)
            .ok_or_else(|| conversion_error(idx, &s)),
    }
}

fn conversion_error(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("unrecognized value: {value}").into(),
    )
}

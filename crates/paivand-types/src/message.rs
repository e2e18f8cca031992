//! Message, attachment, and reaction records.
//!
//! Field names serialize in camelCase to match the wire format the mobile
//! client consumes.

use serde::{Deserialize, Serialize};

use crate::{Locale, PersonaId};

/// The kind of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Voice,
    Media,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Media => "media",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "voice" => Some(Self::Voice),
            "media" => Some(Self::Media),
            _ => None,
        }
    }
}

/// Media category of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }
}

/// A chat message.
///
/// Exactly one of `original_text` (text / media-with-caption) or `audio_url`
/// (voice) is populated at creation, depending on `kind`. Voice messages are
/// created with all translation and transcription fields null; the voice
/// pipeline fills them in at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_persona_id: PersonaId,
    pub original_text: Option<String>,
    pub original_locale: Option<Locale>,
    pub translated_text: Option<String>,
    pub translated_locale: Option<Locale>,
    pub tone_adjusted_text: Option<String>,
    /// Provider that produced the winning translation candidate.
    pub translation_provider: Option<String>,
    pub audio_url: Option<String>,
    pub transcription_text: Option<String>,
    /// Confidence in `0.0..=1.0` reported by the transcription adapter.
    pub transcription_confidence: Option<f64>,
    #[serde(rename = "messageType")]
    pub kind: MessageKind,
    /// Creation timestamp, ISO 8601.
    pub created_at: String,
    pub media: Vec<Attachment>,
    pub reactions: Vec<Reaction>,
}

/// A media attachment belonging to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub message_id: String,
    pub uri: String,
    pub mime_type: String,
    pub media_type: MediaKind,
    pub created_at: String,
}

/// An emoji reaction to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: String,
    pub message_id: String,
    pub persona_id: PersonaId,
    pub emoji: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trip() {
        for kind in [MessageKind::Text, MessageKind::Voice, MessageKind::Media] {
            assert_eq!(MessageKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::parse("sticker"), None);
    }

    #[test]
    fn message_serializes_with_wire_field_names() {
        let message = Message {
            id: "m-1".to_string(),
            sender_persona_id: PersonaId::Brian,
            original_text: Some("Hi there".to_string()),
            original_locale: Some(Locale::En),
            translated_text: None,
            translated_locale: None,
            tone_adjusted_text: None,
            translation_provider: None,
            audio_url: None,
            transcription_text: None,
            transcription_confidence: None,
            kind: MessageKind::Text,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            media: vec![],
            reactions: vec![],
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["senderPersonaId"], "brian");
        assert_eq!(json["messageType"], "text");
        assert_eq!(json["originalText"], "Hi there");
        assert!(json["audioUrl"].is_null());
    }
}

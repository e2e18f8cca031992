//! Live fan-out event payloads.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Reaction};
use crate::PersonaId;

/// Presence state of a persona, as announced on the live stream.
///
/// Presence is ephemeral: it is broadcast to connected clients but never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
}

/// An event published to connected clients over the live stream.
///
/// Delivery is best-effort: a slow or absent subscriber never blocks the
/// publisher. For a given message id, `MessageCreated` always precedes
/// `MessageUpdated` because the update is only produced by the voice
/// pipeline, which starts after the creating write has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A message row was created (text, voice placeholder, or media).
    MessageCreated(Message),
    /// A voice message was enriched by the background pipeline.
    MessageUpdated(Message),
    /// A reaction was added to an existing message.
    ReactionAdded(Reaction),
    /// A persona opened the chat and is now online.
    #[serde(rename_all = "camelCase")]
    PresenceUpdated {
        persona_id: PersonaId,
        status: PresenceStatus,
    },
}

impl ChatEvent {
    /// Stable event name used on the wire and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageCreated(_) => "message_created",
            Self::MessageUpdated(_) => "message_updated",
            Self::ReactionAdded(_) => "reaction_added",
            Self::PresenceUpdated { .. } => "presence_updated",
        }
    }

    /// The id of the message this event concerns, if any. Presence events
    /// are not tied to a message.
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::MessageCreated(m) | Self::MessageUpdated(m) => Some(&m.id),
            Self::ReactionAdded(r) => Some(&r.message_id),
            Self::PresenceUpdated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_matches_serde_tag() {
        let reaction = Reaction {
            id: "r-1".to_string(),
            message_id: "m-1".to_string(),
            persona_id: PersonaId::Khadija,
            emoji: "❤️".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let event = ChatEvent::ReactionAdded(reaction);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.name());
        assert_eq!(event.message_id(), Some("m-1"));
    }

    #[test]
    fn presence_event_serializes_camel_case_payload() {
        let event = ChatEvent::PresenceUpdated {
            persona_id: PersonaId::Brian,
            status: PresenceStatus::Online,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "presence_updated");
        assert_eq!(json["payload"]["personaId"], "brian");
        assert_eq!(json["payload"]["status"], "online");
        assert_eq!(event.message_id(), None);
    }
}

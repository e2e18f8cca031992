//! Shared types and constants for the paivand chat platform.
//!
//! Paivand connects exactly two fixed personas who write in different
//! languages. This crate provides the domain types used across all paivand
//! crates: personas, locales, translation direction, message records, and
//! the live event payloads fanned out to connected clients.
//!
//! No crate in the workspace depends on anything *except* `paivand-types`
//! for cross-cutting type definitions, which keeps the dependency graph
//! acyclic.

use serde::{Deserialize, Serialize};

mod event;
mod message;

pub use event::{ChatEvent, PresenceStatus};
pub use message::{Attachment, MediaKind, Message, MessageKind, Reaction};

/// One of the two fixed chat participants.
///
/// Brian writes English, Khadija writes Persian. There is no persona
/// management: the pair is fixed for the lifetime of the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaId {
    Brian,
    Khadija,
}

impl PersonaId {
    /// The locale this persona writes in.
    pub fn default_locale(self) -> Locale {
        match self {
            Self::Brian => Locale::En,
            Self::Khadija => Locale::Fa,
        }
    }

    /// The translation direction for a message authored by this persona.
    pub fn direction(self) -> Direction {
        match self {
            Self::Brian => Direction::EnToFa,
            Self::Khadija => Direction::FaToEn,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brian => "brian",
            Self::Khadija => "khadija",
        }
    }
}

/// A supported locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Fa,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fa => "fa",
        }
    }

    /// Parses a locale string as stored in the database.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "en" => Some(Self::En),
            "fa" => Some(Self::Fa),
            _ => None,
        }
    }

    /// The direction that translates *from* this locale.
    pub fn direction_from(self) -> Direction {
        match self {
            Self::En => Direction::EnToFa,
            Self::Fa => Direction::FaToEn,
        }
    }
}

/// Which persona's language is source vs. target for a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "en-to-fa")]
    EnToFa,
    #[serde(rename = "fa-to-en")]
    FaToEn,
}

impl Direction {
    pub fn source(self) -> Locale {
        match self {
            Self::EnToFa => Locale::En,
            Self::FaToEn => Locale::Fa,
        }
    }

    pub fn target(self) -> Locale {
        match self {
            Self::EnToFa => Locale::Fa,
            Self::FaToEn => Locale::En,
        }
    }
}

/// The outcome of a successful translation: the raw winning candidate text
/// plus its tone-adjusted form and the provider that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
    pub tone_adjusted_text: String,
    pub locale: Locale,
    /// Name of the contributing provider. `"unknown"` only when no scoring
    /// metadata exists, which does not happen when candidates are present.
    pub provider: String,
}

/// A completed speech-to-text result for one audio resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub text: String,
    /// Adapter-reported confidence in `0.0..=1.0`.
    pub confidence: f64,
    pub locale: Locale,
}

//! The voice message state machine.
//!
//! Stages per message: placeholder write (synchronous) → transcribe →
//! translate → persist → notify, with the last four on a detached task.
//! Failure isolation rules:
//!
//! - transcription unavailable: skip translation, persist the still-null
//!   fields, notify — the message is final in its audio-only form.
//! - translation unavailable: persist the transcription alone; a failed
//!   translation never discards a successful transcription.
//! - persistence failure: log and stop; no notification fires and the
//!   message keeps looking unprocessed.
//!
//! Nothing thrown past the placeholder write ever reaches the uploading
//! request.

use paivand_db::DbPool;
use paivand_store::{NewMessage, VoiceFieldsUpdate};
use paivand_translate::TranslationOrchestrator;
use paivand_types::{Attachment, ChatEvent, Locale, MediaKind, Message, MessageKind, PersonaId};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::transcribe::TranscriptionAdapter;

/// Parameters for a voice message upload.
#[derive(Debug, Clone)]
pub struct VoiceMessageParams {
    pub persona_id: PersonaId,
    /// Stored audio resource; also what the transcriber reads.
    pub audio_url: String,
    /// Locale the sender spoke in; implies the translation direction.
    pub original_locale: Locale,
    /// Prior message texts, most recent first, for translation context.
    pub context: Vec<String>,
}

/// Drives voice messages from placeholder to enriched form.
///
/// Constructed once at startup with its collaborators and cloned wherever
/// needed; holds no per-message state.
#[derive(Clone)]
pub struct VoicePipeline {
    pool: DbPool,
    orchestrator: Arc<TranslationOrchestrator>,
    transcriber: Arc<dyn TranscriptionAdapter>,
    events_tx: broadcast::Sender<ChatEvent>,
}

impl VoicePipeline {
    pub fn new(
        pool: DbPool,
        orchestrator: Arc<TranslationOrchestrator>,
        transcriber: Arc<dyn TranscriptionAdapter>,
        events_tx: broadcast::Sender<ChatEvent>,
    ) -> Self {
        Self {
            pool,
            orchestrator,
            transcriber,
            events_tx,
        }
    }

    /// Writes the placeholder message and audio attachment, publishes the
    /// created event, spawns the background processing task, and returns
    /// the placeholder immediately.
    ///
    /// One task is spawned per message with no global cap; fan-out is
    /// unbounded, a deliberate simplification for a two-person deployment.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` only if the placeholder itself cannot be
    /// persisted; background failures are logged, never propagated.
    pub fn start(&self, params: VoiceMessageParams) -> Result<Message, PipelineError> {
        let message_id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let row = NewMessage {
            id: message_id.clone(),
            sender_persona_id: params.persona_id,
            original_text: None,
            original_locale: Some(params.original_locale),
            translated_text: None,
            translated_locale: None,
            tone_adjusted_text: None,
            translation_provider: None,
            audio_url: Some(params.audio_url.clone()),
            kind: MessageKind::Voice,
            created_at: created_at.clone(),
        };

        let attachment = Attachment {
            id: Uuid::new_v4().to_string(),
            message_id: message_id.clone(),
            uri: params.audio_url.clone(),
            mime_type: "audio/m4a".to_string(),
            media_type: MediaKind::Audio,
            created_at: created_at.clone(),
        };

        {
            let conn = self.pool.get()?;
            paivand_store::create_message(&conn, &row)?;
            paivand_store::add_attachment(&conn, &attachment)?;
        }

        let placeholder = Message {
            id: message_id.clone(),
            sender_persona_id: params.persona_id,
            original_text: None,
            original_locale: Some(params.original_locale),
            translated_text: None,
            translated_locale: None,
            tone_adjusted_text: None,
            translation_provider: None,
            audio_url: Some(params.audio_url.clone()),
            transcription_text: None,
            transcription_confidence: None,
            kind: MessageKind::Voice,
            created_at,
            media: vec![attachment],
            reactions: Vec::new(),
        };

        // Published before the background task exists, so the created event
        // always precedes the updated event for this message id.
        if self.events_tx.send(ChatEvent::MessageCreated(placeholder.clone())).is_err() {
            tracing::debug!(%message_id, "no live subscribers for created event");
        }

        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.process(message_id, params).await;
        });

        Ok(placeholder)
    }

    /// The detached stages: transcribe → translate → persist → notify.
    async fn process(&self, message_id: String, params: VoiceMessageParams) {
        let transcription = self
            .transcriber
            .transcribe(&params.audio_url, params.original_locale)
            .await;

        let mut update = VoiceFieldsUpdate::default();

        if let Some(transcription) = &transcription {
            update.original_text = Some(transcription.text.clone());
            update.transcription_text = Some(transcription.text.clone());
            update.transcription_confidence = Some(transcription.confidence);

            let direction = params.original_locale.direction_from();
            match self
                .orchestrator
                .translate(&transcription.text, direction, &params.context)
                .await
            {
                Ok(translation) => {
                    tracing::debug!(
                        %message_id,
                        provider = %translation.provider,
                        ?direction,
                        "voice message translated"
                    );
                    update.translated_text = Some(translation.translated_text);
                    update.translated_locale = Some(translation.locale);
                    update.tone_adjusted_text = Some(translation.tone_adjusted_text);
                    update.translation_provider = Some(translation.provider);
                }
                Err(e) => {
                    // Keep the transcription; the message ships untranslated.
                    tracing::warn!(%message_id, "voice translation unavailable: {e}");
                }
            }
        } else {
            tracing::debug!(%message_id, "transcription unavailable, keeping audio-only message");
        }

        let pool = self.pool.clone();
        let id = message_id.clone();
        let persisted =
            tokio::task::spawn_blocking(move || -> Result<Option<Message>, PipelineError> {
                let conn = pool.get()?;
                paivand_store::update_voice_fields(&conn, &id, &update)?;
                Ok(paivand_store::get_message(&conn, &id)?)
            })
            .await;

        match persisted {
            Ok(Ok(Some(message))) => {
                if self.events_tx.send(ChatEvent::MessageUpdated(message)).is_err() {
                    tracing::debug!(%message_id, "no live subscribers for updated event");
                }
            }
            Ok(Ok(None)) => {
                tracing::error!(%message_id, "voice message vanished before notification");
            }
            Ok(Err(e)) => {
                tracing::error!(%message_id, "voice message persistence failed: {e}");
            }
            Err(e) => {
                tracing::error!(%message_id, "voice persistence task failed: {e}");
            }
        }
    }
}

//! Shared fixtures for server integration tests.

use async_trait::async_trait;
use paivand_db::{create_pool, run_migrations, DbRuntimeSettings};
use paivand_server::AppState;
use paivand_translate::{
    AnalyticsRecorder, ProviderError, TranslationOrchestrator, TranslationProvider,
};
use paivand_types::{ChatEvent, Direction, Locale, Transcription};
use paivand_voice::{TranscriptionAdapter, VoicePipeline};
use std::sync::Arc;
use tokio::sync::broadcast;

/// A canned translation backend with a fixed name and response.
pub struct StaticProvider {
    name: &'static str,
    response: Option<String>,
}

impl StaticProvider {
    pub fn ok(name: &'static str, text: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            response: Some(text.to_string()),
        })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            response: None,
        })
    }
}

#[async_trait]
impl TranslationProvider for StaticProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn translate(
        &self,
        _text: &str,
        _direction: Direction,
        _context: &[String],
    ) -> Result<String, ProviderError> {
        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(ProviderError::Malformed("canned failure".to_string())),
        }
    }
}

/// A canned transcriber returning a fixed result for every audio path.
pub struct StaticTranscriber {
    transcription: Option<Transcription>,
}

#[async_trait]
impl TranscriptionAdapter for StaticTranscriber {
    async fn transcribe(&self, _audio_path: &str, _locale: Locale) -> Option<Transcription> {
        self.transcription.clone()
    }
}

/// Builds an [`AppState`] over an in-memory database.
///
/// The pool is capped at one connection: an in-memory SQLite database is
/// per-connection, so a larger pool would hand out empty databases.
pub fn test_state(
    providers: Vec<Arc<dyn TranslationProvider>>,
    transcription: Option<Transcription>,
) -> AppState {
    let settings = DbRuntimeSettings {
        busy_timeout_ms: 1_000,
        pool_max_size: 1,
    };
    let pool = create_pool(":memory:", settings).expect("failed to create pool");
    run_migrations(&pool.get().expect("conn")).expect("failed to run migrations");

    let recorder = AnalyticsRecorder::new(pool.clone());
    let orchestrator = Arc::new(TranslationOrchestrator::new(providers, recorder.clone()));
    let (events_tx, _) = broadcast::channel::<ChatEvent>(64);
    let pipeline = VoicePipeline::new(
        pool.clone(),
        Arc::clone(&orchestrator),
        Arc::new(StaticTranscriber { transcription }),
        events_tx.clone(),
    );

    AppState {
        pool,
        orchestrator,
        pipeline,
        recorder,
        events_tx,
    }
}

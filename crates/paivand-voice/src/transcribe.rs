//! Speech-to-text via Deepgram.
//!
//! Transcription is best-effort by contract: a missing credential, an
//! unreadable file, or an adapter failure all yield `None` rather than an
//! error, and the caller persists the message audio-only.

use async_trait::async_trait;
use paivand_types::{Locale, Transcription};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEEPGRAM_ENDPOINT: &str = "https://api.deepgram.com/v1/listen";

/// Timeout for a single transcription request.
const DEEPGRAM_TIMEOUT: Duration = Duration::from_secs(25);

/// A speech-to-text backend.
#[async_trait]
pub trait TranscriptionAdapter: Send + Sync {
    /// Transcribes the audio resource at `audio_path` (relative paths are
    /// resolved against the media root), hinted with `locale`.
    ///
    /// Returns `None` when transcription is unavailable for any reason;
    /// this is a normal outcome, never an error.
    async fn transcribe(&self, audio_path: &str, locale: Locale) -> Option<Transcription>;
}

/// Deepgram credentials and model selection.
#[derive(Clone, Deserialize)]
pub struct DeepgramConfig {
    /// API key. Empty means transcription is disabled.
    #[serde(default)]
    pub api_key: String,

    /// Deepgram model name.
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "nova-2".to_string()
}

impl Default for DeepgramConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
        }
    }
}

impl fmt::Debug for DeepgramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepgramConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    transcript: String,
    confidence: Option<f64>,
}

/// Deepgram-backed [`TranscriptionAdapter`].
#[derive(Debug, Clone)]
pub struct DeepgramTranscriber {
    client: reqwest::Client,
    config: DeepgramConfig,
    media_root: PathBuf,
}

impl DeepgramTranscriber {
    pub fn new(config: DeepgramConfig, media_root: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            media_root: media_root.into(),
        }
    }

    fn resolve_mime_type(path: &Path) -> &'static str {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("m4a") => "audio/mp4",
            Some("mp3") => "audio/mpeg",
            Some("wav") => "audio/wav",
            _ => "audio/*",
        }
    }

    fn parse_response(response: ListenResponse, locale: Locale) -> Option<Transcription> {
        let alternative = response
            .results?
            .channels
            .into_iter()
            .next()?
            .alternatives
            .into_iter()
            .next()?;
        if alternative.transcript.is_empty() {
            return None;
        }
        Some(Transcription {
            text: alternative.transcript,
            confidence: alternative.confidence.unwrap_or(0.0),
            locale,
        })
    }
}

#[async_trait]
impl TranscriptionAdapter for DeepgramTranscriber {
    async fn transcribe(&self, audio_path: &str, locale: Locale) -> Option<Transcription> {
        if self.config.api_key.is_empty() {
            tracing::warn!(audio_path, "deepgram API key missing, skipping transcription");
            return None;
        }

        let path = Path::new(audio_path);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.media_root.join(path)
        };

        let audio = match tokio::fs::read(&absolute).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(
                    audio_path = %absolute.display(),
                    "failed to read audio file for transcription: {e}"
                );
                return None;
            }
        };

        let mime_type = Self::resolve_mime_type(&absolute);

        let response = self
            .client
            .post(DEEPGRAM_ENDPOINT)
            .timeout(DEEPGRAM_TIMEOUT)
            .header("Authorization", format!("Token {}", self.config.api_key))
            .header("Content-Type", mime_type)
            .query(&[
                ("model", self.config.model.as_str()),
                ("language", locale.as_str()),
                ("smart_format", "true"),
            ])
            .body(audio)
            .send()
            .await;

        let parsed = match response {
            Ok(response) => match response.error_for_status() {
                Ok(response) => response.json::<ListenResponse>().await,
                Err(e) => {
                    tracing::error!(audio_path = %absolute.display(), "deepgram rejected the request: {e}");
                    return None;
                }
            },
            Err(e) => {
                tracing::error!(audio_path = %absolute.display(), "failed to reach deepgram: {e}");
                return None;
            }
        };

        match parsed {
            Ok(body) => {
                let transcription = Self::parse_response(body, locale);
                if transcription.is_none() {
                    tracing::warn!(audio_path = %absolute.display(), "deepgram returned no transcript");
                }
                transcription
            }
            Err(e) => {
                tracing::error!(audio_path = %absolute.display(), "malformed deepgram response: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_debug_redacts_the_key() {
        let config = DeepgramConfig {
            api_key: "dg-secret".to_string(),
            model: "nova-2".to_string(),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("dg-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn mime_type_by_extension() {
        assert_eq!(
            DeepgramTranscriber::resolve_mime_type(Path::new("a.m4a")),
            "audio/mp4"
        );
        assert_eq!(
            DeepgramTranscriber::resolve_mime_type(Path::new("a.wav")),
            "audio/wav"
        );
        assert_eq!(
            DeepgramTranscriber::resolve_mime_type(Path::new("a.ogg")),
            "audio/*"
        );
    }

    #[test]
    fn empty_transcript_is_unavailable() {
        let response = ListenResponse {
            results: Some(ListenResults {
                channels: vec![ListenChannel {
                    alternatives: vec![ListenAlternative {
                        transcript: String::new(),
                        confidence: Some(0.9),
                    }],
                }],
            }),
        };
        assert!(DeepgramTranscriber::parse_response(response, Locale::Fa).is_none());
    }

    #[test]
    fn missing_confidence_defaults_to_zero() {
        let response = ListenResponse {
            results: Some(ListenResults {
                channels: vec![ListenChannel {
                    alternatives: vec![ListenAlternative {
                        transcript: "سلام".to_string(),
                        confidence: None,
                    }],
                }],
            }),
        };
        let transcription =
            DeepgramTranscriber::parse_response(response, Locale::Fa).expect("should parse");
        assert_eq!(transcription.text, "سلام");
        assert_eq!(transcription.confidence, 0.0);
        assert_eq!(transcription.locale, Locale::Fa);
    }

    #[tokio::test]
    async fn missing_key_skips_transcription() {
        let transcriber = DeepgramTranscriber::new(DeepgramConfig::default(), "/tmp");
        assert!(transcriber.transcribe("voice.m4a", Locale::Fa).await.is_none());
    }

    #[tokio::test]
    async fn unreadable_file_skips_transcription() {
        let config = DeepgramConfig {
            api_key: "dg-test".to_string(),
            model: "nova-2".to_string(),
        };
        let dir = tempfile::tempdir().expect("tempdir");
        let transcriber = DeepgramTranscriber::new(config, dir.path());
        assert!(
            transcriber
                .transcribe("does-not-exist.m4a", Locale::En)
                .await
                .is_none()
        );
    }
}

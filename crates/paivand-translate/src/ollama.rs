//! Ollama translation backend.
//!
//! Talks to a local Ollama instance via its `/api/generate` endpoint with a
//! bilingual prompt that asks for a warm, natural rendering rather than a
//! literal one.

use async_trait::async_trait;
use paivand_types::Direction;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ProviderError;
use crate::provider::TranslationProvider;

/// Timeout for a single Ollama generation request.
const OLLAMA_TIMEOUT: Duration = Duration::from_secs(20);

/// Maximum number of context lines folded into the prompt.
const MAX_CONTEXT_LINES: usize = 5;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn build_prompt(&self, text: &str, direction: Direction, context: &[String]) -> String {
        let (source_language, target_language, tone_instructions) = match direction {
            Direction::EnToFa => (
                "English",
                "Persian",
                "Keep the tone tender, familial, add natural warmth and loving expressions \
                 without sounding machine-translated.",
            ),
            Direction::FaToEn => (
                "Persian",
                "English",
                "Translate to clear, friendly English while keeping affectionate nuances.",
            ),
        };

        let context_joined = context
            .iter()
            .filter(|line| !line.is_empty())
            .take(MAX_CONTEXT_LINES)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a caring bilingual assistant helping two partners communicate.\n\
             Context (most recent first):\n{context_joined}\n\n\
             Translate the following {source_language} message into {target_language}.\n\
             Return only the translated sentence with polished, loving tone.\n\
             Message: {text}\n\n{tone_instructions}"
        )
    }
}

#[async_trait]
impl TranslationProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn translate(
        &self,
        text: &str,
        direction: Direction,
        context: &[String],
    ) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: self.build_prompt(text, direction, context),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(OLLAMA_TIMEOUT)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        match response.response {
            Some(text) => Ok(text.trim().to_string()),
            None => Err(ProviderError::Malformed(
                "ollama response missing 'response' field".to_string(),
            )),
        }
    }
}

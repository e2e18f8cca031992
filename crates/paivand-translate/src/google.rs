//! Google Translate fallback backend.
//!
//! Uses the unauthenticated `translate_a/single` endpoint (the same one the
//! original deployment relied on through a client library). The response is
//! a deeply nested JSON array; the translated sentence segments live at
//! `[0][i][0]`.

use async_trait::async_trait;
use paivand_types::Direction;
use serde_json::Value;
use std::time::Duration;

use crate::error::ProviderError;
use crate::provider::TranslationProvider;

const GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Timeout for a single Google Translate request.
const GOOGLE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct GoogleProvider {
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn extract_translation(body: &Value) -> Option<String> {
        let segments = body.get(0)?.as_array()?;
        let mut out = String::new();
        for segment in segments {
            if let Some(text) = segment.get(0).and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

impl Default for GoogleProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslationProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        direction: Direction,
        _context: &[String],
    ) -> Result<String, ProviderError> {
        let body = self
            .client
            .get(GOOGLE_ENDPOINT)
            .timeout(GOOGLE_TIMEOUT)
            .query(&[
                ("client", "gtx"),
                ("sl", direction.source().as_str()),
                ("tl", direction.target().as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        Self::extract_translation(&body).ok_or_else(|| {
            ProviderError::Malformed("google response carried no translation segments".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_and_joins_segments() {
        let body = json!([
            [
                ["سلام ", "Hello ", null],
                ["دنیا", "world", null]
            ],
            null,
            "en"
        ]);
        assert_eq!(
            GoogleProvider::extract_translation(&body).as_deref(),
            Some("سلام دنیا")
        );
    }

    #[test]
    fn empty_body_is_none() {
        assert_eq!(GoogleProvider::extract_translation(&json!([[]])), None);
        assert_eq!(GoogleProvider::extract_translation(&json!(null)), None);
    }
}

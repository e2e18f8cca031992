//! The seam between the orchestrator and concrete translation backends.

use async_trait::async_trait;
use paivand_types::Direction;

use crate::error::ProviderError;

/// A translation backend.
///
/// Implementations must enforce their own bounded request timeout so a
/// single slow backend cannot stall the provider race indefinitely.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Stable provider name used for scoring, analytics, and the
    /// `translation_provider` field on messages.
    fn name(&self) -> &'static str;

    /// Translates `text` along `direction`. `context` holds up to five
    /// prior message texts, most recent first; backends may use it to
    /// improve phrasing but must not require it.
    async fn translate(
        &self,
        text: &str,
        direction: Direction,
        context: &[String],
    ) -> Result<String, ProviderError>;
}

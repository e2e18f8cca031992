//! The provider race and candidate selection.
//!
//! `translate` fans out one concurrent attempt per configured provider,
//! waits for every attempt to settle (there is no early exit — scoring
//! needs to compare all survivors), scores the candidates, tone-adjusts
//! the winner, and reports the selection to analytics.

use paivand_types::{Direction, Locale, TranslationResult};
use std::sync::Arc;
use std::time::Instant;

use crate::analytics::AnalyticsRecorder;
use crate::error::TranslateError;
use crate::provider::TranslationProvider;
use crate::tone::add_warmth;

/// One provider's raw output plus its measured wall-clock latency.
/// Created per translate call, discarded after selection.
#[derive(Debug, Clone)]
struct Candidate {
    provider: &'static str,
    text: String,
    latency_ms: u64,
}

/// Races the configured providers and selects the best candidate.
///
/// Stateless per invocation: holds only the adapter list (in configuration
/// order, which doubles as the tie-break order) and the analytics recorder
/// it was constructed with.
pub struct TranslationOrchestrator {
    providers: Vec<Arc<dyn TranslationProvider>>,
    recorder: AnalyticsRecorder,
}

impl TranslationOrchestrator {
    /// `providers` must be in configuration order; iteration over it is
    /// stable and the earlier provider wins score ties.
    pub fn new(providers: Vec<Arc<dyn TranslationProvider>>, recorder: AnalyticsRecorder) -> Self {
        Self {
            providers,
            recorder,
        }
    }

    /// Translates `text` along `direction`, using up to five prior message
    /// texts in `context` (most recent first) as phrasing context.
    ///
    /// Fails with [`TranslateError::NoCandidates`] when no provider is
    /// configured or every attempt fails.
    pub async fn translate(
        &self,
        text: &str,
        direction: Direction,
        context: &[String],
    ) -> Result<TranslationResult, TranslateError> {
        let candidates = self.collect_candidates(text, direction, context).await;
        if candidates.is_empty() {
            return Err(TranslateError::NoCandidates);
        }

        let selected = select_best(text, direction, context, &candidates);
        let tone_adjusted = add_warmth(&selected.text, direction.target(), context);

        tracing::debug!(
            provider = selected.provider,
            latency_ms = selected.latency_ms,
            ?direction,
            "selected translation provider"
        );

        self.record_selection(selected.provider, selected.latency_ms)
            .await;

        Ok(TranslationResult {
            translated_text: selected.text.clone(),
            tone_adjusted_text: tone_adjusted,
            locale: direction.target(),
            provider: selected.provider.to_string(),
        })
    }

    /// Launches every provider attempt concurrently and waits for all of
    /// them to settle. A failed attempt drops that provider from the
    /// candidate set without affecting the others. Candidates come back in
    /// provider-configuration order.
    async fn collect_candidates(
        &self,
        text: &str,
        direction: Direction,
        context: &[String],
    ) -> Vec<Candidate> {
        let mut handles = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let text = text.to_string();
            let context = context.to_vec();
            handles.push(tokio::spawn(async move {
                let start = Instant::now();
                match provider.translate(&text, direction, &context).await {
                    Ok(translated) => Some(Candidate {
                        provider: provider.name(),
                        text: translated,
                        latency_ms: start.elapsed().as_millis() as u64,
                    }),
                    Err(e) => {
                        tracing::warn!(
                            provider = provider.name(),
                            "translation attempt failed: {e}"
                        );
                        None
                    }
                }
            }));
        }

        let mut candidates = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) => tracing::warn!("translation attempt task failed: {e}"),
            }
        }
        candidates
    }

    /// Reports the winning provider to analytics. Failures are logged and
    /// swallowed; they never fail the translation call.
    async fn record_selection(&self, provider: &'static str, latency_ms: u64) {
        let recorder = self.recorder.clone();
        let result =
            tokio::task::spawn_blocking(move || recorder.record(provider, latency_ms as f64))
                .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(provider, "failed to record translation analytics: {e}")
            }
            Err(e) => tracing::warn!(provider, "analytics recording task failed: {e}"),
        }
    }
}

/// Picks the candidate with the strict maximum score; the earlier candidate
/// wins ties. A lone survivor is selected without scoring.
fn select_best<'a>(
    original: &str,
    direction: Direction,
    context: &[String],
    candidates: &'a [Candidate],
) -> &'a Candidate {
    if candidates.len() == 1 {
        return &candidates[0];
    }

    let mut best = &candidates[0];
    let mut best_score = f64::NEG_INFINITY;
    for candidate in candidates {
        let score = score_candidate(original, candidate, direction, context);
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }
    best
}

/// Heuristic candidate score. An empty candidate is disqualified outright.
fn score_candidate(
    original: &str,
    candidate: &Candidate,
    direction: Direction,
    context: &[String],
) -> f64 {
    let text = candidate.text.trim();
    if text.is_empty() {
        return f64::NEG_INFINITY;
    }

    let mut score = 0.0;

    score += affection_heuristic(text, direction.target());

    let length_delta = (text.len() as f64 - original.len() as f64).abs();
    score -= length_delta * 0.01;

    if text.to_lowercase() == original.to_lowercase() {
        score -= 5.0;
    }

    let context_affinity = context
        .iter()
        .filter(|line| !line.is_empty())
        .any(|line| {
            let prefix: String = line.chars().take(6).collect();
            text.contains(&prefix)
        });
    if context_affinity {
        score += 0.5;
    }

    score -= candidate.latency_ms as f64 / 1000.0;

    // Empirically the local model reads Persian better than the fallback.
    if candidate.provider == "ollama" && direction == Direction::FaToEn {
        score += 0.5;
    }

    score
}

/// Bonus for candidates that already sound affectionate in the target
/// locale: endearment words score 1.5, a heart emoji another 1.0.
fn affection_heuristic(text: &str, target: Locale) -> f64 {
    let mut score = 0.0;
    match target {
        Locale::Fa => {
            if ["عزیزم", "جانم", "مهربانم"]
                .iter()
                .any(|word| text.contains(word))
            {
                score += 1.5;
            }
        }
        Locale::En => {
            let lower = text.to_lowercase();
            if ["dear", "love", "sweetheart", "my heart"]
                .iter()
                .any(|word| lower.contains(word))
            {
                score += 1.5;
            }
        }
    }
    if text.contains("❤️") {
        score += 1.0;
    }
    score
}

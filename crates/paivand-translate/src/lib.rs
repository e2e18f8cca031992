//! Translation core for the paivand chat platform.
//!
//! Races the configured translation backends against each other for every
//! message, scores the surviving candidates with a warmth-aware heuristic,
//! applies a deterministic tone adjustment to the winner, and records which
//! provider won (and how fast it was) for analytics.
//!
//! Providers are resolved once at startup into an ordered list and injected
//! into [`TranslationOrchestrator::new`]; nothing in this crate reads
//! configuration or holds global state.

pub mod analytics;
pub mod error;
pub mod google;
pub mod ollama;
pub mod orchestrator;
pub mod provider;
pub mod tone;

pub use analytics::{AnalyticsRecorder, ProviderStat};
pub use error::{ProviderError, TranslateError};
pub use google::GoogleProvider;
pub use ollama::OllamaProvider;
pub use orchestrator::TranslationOrchestrator;
pub use provider::TranslationProvider;
pub use tone::add_warmth;

use thiserror::Error;

/// A single provider attempt failed.
///
/// Always recovered locally: the failed provider is dropped from the
/// candidate set and the race continues with the others.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from provider: {0}")]
    Malformed(String),
}

/// Errors surfaced by the translation orchestrator.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Every provider attempt failed, or no providers are configured.
    /// Callers must treat this as "unable to translate", not as
    /// "leave untranslated".
    #[error("no translation candidates available")]
    NoCandidates,
}

/// Errors from the analytics recorder.
///
/// The orchestrator logs and swallows these; they never fail a translation.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

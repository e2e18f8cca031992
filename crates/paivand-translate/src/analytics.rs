//! Durable provider-selection analytics.
//!
//! Every winning candidate is recorded as one row increment in
//! `translation_provider_stats`. The write is a single conditional upsert
//! so concurrent recorders on different connections never lose an update;
//! no counts are cached in-process between calls.

use chrono::{SecondsFormat, Utc};
use paivand_db::DbPool;
use serde::Serialize;

use crate::error::AnalyticsError;

/// Aggregated selection statistics for one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStat {
    pub provider: String,
    pub selection_count: u64,
    /// Rounded mean latency, or `None` when nothing has been recorded.
    pub average_latency_ms: Option<u64>,
    pub last_selected_at: Option<String>,
}

/// Records and reads per-provider selection analytics.
///
/// Cheap to clone; clones share the underlying pool.
#[derive(Debug, Clone)]
pub struct AnalyticsRecorder {
    pool: DbPool,
}

impl AnalyticsRecorder {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Upserts one selection for `provider`: count +1, latency sum
    /// +`max(0, round(latency_ms))`, last-selected timestamp = now.
    pub fn record(&self, provider: &str, latency_ms: f64) -> Result<(), AnalyticsError> {
        let safe_latency_ms = if latency_ms.is_finite() {
            latency_ms.round().max(0.0) as i64
        } else {
            0
        };
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO translation_provider_stats
                (provider, selection_count, total_latency_ms, last_selected_at)
             VALUES (?1, 1, ?2, ?3)
             ON CONFLICT(provider) DO UPDATE SET
                selection_count = selection_count + 1,
                total_latency_ms = total_latency_ms + excluded.total_latency_ms,
                last_selected_at = excluded.last_selected_at",
            rusqlite::params![provider, safe_latency_ms, now],
        )?;
        Ok(())
    }

    /// Lists all provider stats ordered by provider identifier.
    ///
    /// Reads reflect whatever has been committed at call time.
    pub fn list(&self) -> Result<Vec<ProviderStat>, AnalyticsError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT provider, selection_count, total_latency_ms, last_selected_at
             FROM translation_provider_stats
             ORDER BY provider ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let selection_count: u64 = row.get(1)?;
            let total_latency_ms: u64 = row.get(2)?;
            let average_latency_ms = if selection_count > 0 {
                Some((total_latency_ms as f64 / selection_count as f64).round() as u64)
            } else {
                None
            };
            Ok(ProviderStat {
                provider: row.get(0)?,
                selection_count,
                average_latency_ms,
                last_selected_at: row.get(3)?,
            })
        })?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        Ok(stats)
    }
}

use paivand_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the synchronous part of the voice pipeline.
///
/// Only the placeholder write can fail into the caller; everything after
/// it runs detached and logs its own failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

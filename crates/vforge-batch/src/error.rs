//! Batch error types.
//!
//! Job-level failures are never errors here: they are recorded in the
//! job's outcome. Only configuration problems and scheduler faults
//! surface as `BatchError`.

use thiserror::Error;

pub type BatchResult<T> = Result<T, BatchError>;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] vforge_models::ConfigError),

    #[error("Output path escapes the output directory: {0}")]
    PathEscape(String),

    #[error("Batch task failed: {0}")]
    Join(String),
}

//! Pipeline errors.

use thiserror::Error;

/// Failures surfaced to the caller of [`QaPipeline`](crate::QaPipeline).
///
/// Everything else (service errors, malformed responses, failed lookups)
/// degrades inside the pipeline instead of reaching the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("pipeline worker panicked")]
    WorkerPanicked,
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

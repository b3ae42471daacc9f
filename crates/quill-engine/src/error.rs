use thiserror::Error;

use crate::passes::PipelineError;
use crate::source::SourceError;

/// Failures that stop a compilation. Problems in the template itself are
/// diagnostics, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("compilation was cancelled")]
    Cancelled,
    #[error("invalid pipeline: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("pass `{pass}` failed: {message}")]
    Pass { pass: &'static str, message: String },
    #[error("invalid mapping table: {0}")]
    InvalidMappings(String),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("a compilation worker panicked")]
    WorkerPanicked,
}

use thiserror::Error;

use crate::engine::EngineError;
use crate::model::FeatureSetError;

/// Errors returned by [`Pipeline`](super::Pipeline).
///
/// Provider failures are not among them: a page whose text or embedding cannot be produced is
/// processed with that signal absent.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid feature set: {0}")]
    FeatureSet(#[from] FeatureSetError),

    #[error("document task failed: {0}")]
    TaskFailed(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors from constructing the ordering engine.
///
/// Ordering itself never fails: missing signals, collaborator failures and inconsistent
/// duplicate references are recorded on the decision instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;

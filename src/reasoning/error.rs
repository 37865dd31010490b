use thiserror::Error;

/// Failures of the external reasoning collaborator.
///
/// None of these fail an ordering run; the engine records them and keeps the rule-based order.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReasoningError {
    /// The service could not be reached or refused the request.
    #[error("reasoning service unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete in time.
    #[error("reasoning call timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    /// The reply could not be understood.
    #[error("invalid reasoning response: {0}")]
    InvalidResponse(String),
}

use thiserror::Error;

/// Failures reported by text and embedding providers.
///
/// The pipeline treats both as absent data for the affected page, never as a run failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("text extraction failed for page {index}: {reason}")]
    ExtractionFailed { index: usize, reason: String },

    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),
}

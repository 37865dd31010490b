use thiserror::Error;

/// Rejections raised when assembling a [`super::DocumentFeatureSet`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeatureSetError {
    #[error("page index {index} appears more than once")]
    DuplicateIndex { index: usize },

    #[error("page indices must be contiguous from 0; missing index {missing}")]
    NonContiguousIndex { missing: usize },
}

use serde::{Deserialize, Serialize};

use super::error::ProviderError;

/// Text for one page as returned by an extractor or OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    /// Extractor's own confidence in `[0, 1]`; `1.0` for embedded text streams.
    pub confidence: f64,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Supplies page text by original page index.
pub trait TextProvider: Send + Sync {
    fn page_count(&self) -> usize;

    fn extract(&self, index: usize) -> Result<ExtractedText, ProviderError>;
}

/// Pages already held in memory. A `None` entry reports [`ProviderError::ExtractionFailed`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryTextProvider {
    pages: Vec<Option<String>>,
}

impl InMemoryTextProvider {
    pub fn new(pages: Vec<Option<String>>) -> Self {
        Self { pages }
    }

    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: texts.into_iter().map(|t| Some(t.into())).collect(),
        }
    }
}

impl TextProvider for InMemoryTextProvider {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract(&self, index: usize) -> Result<ExtractedText, ProviderError> {
        match self.pages.get(index) {
            Some(Some(text)) => Ok(ExtractedText::new(text.clone(), 1.0)),
            Some(None) => Err(ProviderError::ExtractionFailed {
                index,
                reason: "no text layer".to_string(),
            }),
            None => Err(ProviderError::ExtractionFailed {
                index,
                reason: format!("page out of range (document has {})", self.pages.len()),
            }),
        }
    }
}

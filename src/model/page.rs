use serde::Serialize;

use super::error::FeatureSetError;
use crate::hashing::{ContentHash, hash_page_text};
use crate::signals::PatternFamily;

/// A detected page number with its confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageNumber {
    /// Always positive.
    pub value: u32,
    pub confidence: f64,
    /// Pattern family that produced the value.
    pub pattern: PatternFamily,
}

/// Section label assigned by the keyword classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionTag {
    pub label: String,
    /// Expected document position; lower ranks come earlier.
    pub rank: u32,
    /// Rank mapped into `(0, 1]` by catalogue position (earliest entry = `1.0`).
    pub signal: f64,
    /// Raw keyword score that won the classification.
    pub score: f64,
}

/// Heading number read from a page title: `3.2.1`, `Article IV`, `Schedule 2` or `(a)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionNumber {
    /// The number as written; roman numerals upper-cased.
    pub label: String,
    /// Compared lexicographically, so `3 < 3.1 < 3.2 < 3.2.1 < 4`.
    pub key: Vec<u32>,
}

impl SectionNumber {
    pub fn new(label: impl Into<String>, key: Vec<u32>) -> Self {
        Self {
            label: label.into(),
            key,
        }
    }
}

/// One page of a document as seen by the ordering engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Original (shuffled) position; unique within the document.
    pub index: usize,
    /// Extracted text, read-only input.
    pub text: String,
    pub content_hash: ContentHash,
    /// Heading-like first line, when one was found.
    pub title: Option<String>,
    /// Too little text to carry any signal.
    pub blank: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub detected_number: Option<PageNumber>,
    pub section: Option<SectionTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_number: Option<SectionNumber>,
    /// Index of the canonical page this one duplicates.
    pub duplicate_of: Option<usize>,
}

impl Page {
    /// Creates a page with only text-derived identity filled in; signals start absent.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let content_hash = hash_page_text(&text);
        Self {
            index,
            text,
            content_hash,
            title: None,
            blank: false,
            embedding: None,
            detected_number: None,
            section: None,
            section_number: None,
            duplicate_of: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_number(mut self, value: u32, confidence: f64) -> Self {
        self.detected_number = Some(PageNumber {
            value,
            confidence,
            pattern: PatternFamily::Explicit,
        });
        self
    }

    pub fn with_section(mut self, section: SectionTag) -> Self {
        self.section = Some(section);
        self
    }

    pub fn with_section_number(mut self, number: SectionNumber) -> Self {
        self.section_number = Some(number);
        self
    }

    pub fn with_duplicate_of(mut self, canonical: usize) -> Self {
        self.duplicate_of = Some(canonical);
        self
    }

    /// Returns the detected number when its confidence reaches `floor`.
    #[inline]
    pub fn accepted_number(&self, floor: f64) -> Option<u32> {
        self.detected_number
            .filter(|n| n.confidence >= floor)
            .map(|n| n.value)
    }
}

/// All pages of one document in ingestion order, owned by a single ordering run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentFeatureSet {
    pages: Vec<Page>,
}

impl DocumentFeatureSet {
    /// Builds the set, requiring indices `0..n` with no repeats (in any input order).
    pub fn from_pages(mut pages: Vec<Page>) -> Result<Self, FeatureSetError> {
        pages.sort_by_key(|p| p.index);

        for (position, page) in pages.iter().enumerate() {
            if page.index < position {
                return Err(FeatureSetError::DuplicateIndex { index: page.index });
            }
            if page.index > position {
                return Err(FeatureSetError::NonContiguousIndex { missing: position });
            }
        }

        Ok(Self { pages })
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pages_sorts_by_index() {
        let set = DocumentFeatureSet::from_pages(vec![
            Page::new(2, "c"),
            Page::new(0, "a"),
            Page::new(1, "b"),
        ])
        .unwrap();

        let indices: Vec<_> = set.pages().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(set.page(1).unwrap().text, "b");
    }

    #[test]
    fn test_from_pages_rejects_repeated_index() {
        let err = DocumentFeatureSet::from_pages(vec![Page::new(0, "a"), Page::new(0, "b")])
            .unwrap_err();
        assert_eq!(err, FeatureSetError::DuplicateIndex { index: 0 });
    }

    #[test]
    fn test_from_pages_rejects_gap() {
        let err = DocumentFeatureSet::from_pages(vec![Page::new(0, "a"), Page::new(2, "c")])
            .unwrap_err();
        assert_eq!(err, FeatureSetError::NonContiguousIndex { missing: 1 });
    }

    #[test]
    fn test_accepted_number_respects_floor() {
        let page = Page::new(0, "x").with_number(4, 0.45);
        assert_eq!(page.accepted_number(0.5), None);
        assert_eq!(page.accepted_number(0.4), Some(4));
    }

    #[test]
    fn test_new_page_has_no_signals() {
        let page = Page::new(3, "Some text");
        assert!(page.detected_number.is_none());
        assert!(page.section.is_none());
        assert!(page.embedding.is_none());
        assert_eq!(page.content_hash, hash_page_text("some   TEXT"));
    }
}

//! Test fixtures for integration tests.

#![allow(dead_code)]

use folio::model::{DocumentFeatureSet, Page, SectionTag};

pub const FULL_CONFIDENCE: f64 = 1.0;

/// Builds a [`Page`] with explicit signals, bypassing text extraction.
#[derive(Default)]
pub struct PageBuilder {
    index: usize,
    text: Option<String>,
    number: Option<(u32, f64)>,
    section: Option<SectionTag>,
    embedding: Option<Vec<f32>>,
    duplicate_of: Option<usize>,
}

impl PageBuilder {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn number(mut self, value: u32, confidence: f64) -> Self {
        self.number = Some((value, confidence));
        self
    }

    pub fn section(mut self, label: &str, rank: u32, signal: f64) -> Self {
        self.section = Some(SectionTag {
            label: label.to_string(),
            rank,
            signal,
            score: 1.0,
        });
        self
    }

    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn duplicate_of(mut self, canonical: usize) -> Self {
        self.duplicate_of = Some(canonical);
        self
    }

    pub fn build(self) -> Page {
        let text = self
            .text
            .unwrap_or_else(|| format!("body text of original page {}", self.index));
        let mut page = Page::new(self.index, text);
        if let Some((value, confidence)) = self.number {
            page = page.with_number(value, confidence);
        }
        if let Some(section) = self.section {
            page = page.with_section(section);
        }
        if let Some(embedding) = self.embedding {
            page = page.with_embedding(embedding);
        }
        if let Some(canonical) = self.duplicate_of {
            page = page.with_duplicate_of(canonical);
        }
        page
    }
}

pub fn document(pages: Vec<Page>) -> DocumentFeatureSet {
    DocumentFeatureSet::from_pages(pages).expect("fixture pages are contiguous")
}

/// Pages `0..numbers.len()` where page `i` carries `numbers[i]` at full confidence.
pub fn numbered_document(numbers: &[u32]) -> DocumentFeatureSet {
    document(
        numbers
            .iter()
            .enumerate()
            .map(|(i, &n)| PageBuilder::new(i).number(n, FULL_CONFIDENCE).build())
            .collect(),
    )
}

/// `count` pages with text only.
pub fn unlabeled_document(count: usize) -> DocumentFeatureSet {
    document((0..count).map(|i| PageBuilder::new(i).build()).collect())
}

/// 2-D unit vector at `degrees`; cosine between two of them is the cosine of the angle gap.
pub fn unit_embedding(degrees: f64) -> Vec<f32> {
    let radians = degrees.to_radians();
    vec![radians.cos() as f32, radians.sin() as f32]
}

/// Page text with a "Page N of M" footer.
pub fn footer_text(body: &str, number: u32, total: u32) -> String {
    format!("{body}\nThis page continues the narrative of the document.\nPage {number} of {total}")
}

/// Checks that `ordering` holds every expected index exactly once.
pub fn is_permutation_of(ordering: &[usize], expected: &[usize]) -> bool {
    let mut sorted = ordering.to_vec();
    sorted.sort_unstable();
    let mut expected = expected.to_vec();
    expected.sort_unstable();
    sorted == expected
}

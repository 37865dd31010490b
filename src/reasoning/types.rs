use serde::{Deserialize, Serialize};

use crate::constants::{SUMMARY_EDGE_CHARS, SUMMARY_EXCERPT_CHARS, SUMMARY_TITLE_CHARS};
use crate::hashing::normalize_whitespace;
use crate::model::Page;

/// Compact, model-friendly view of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// First lines of the page.
    pub header: String,
    /// Last lines of the page.
    pub footer: String,
    /// Whitespace-collapsed opening text.
    pub excerpt: String,
    /// Accepted page number, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Heading number from the title, such as `3.2` or `Article IV`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_number: Option<String>,
}

const EDGE_LINES: usize = 3;

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

impl PageSummary {
    /// Builds the summary; numbers below `number_floor` are left out.
    pub fn from_page(page: &Page, number_floor: f64) -> Self {
        let lines: Vec<&str> = page
            .text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let header = lines.iter().take(EDGE_LINES).copied().collect::<Vec<_>>().join(" | ");
        let footer = lines[lines.len().saturating_sub(EDGE_LINES)..].join(" | ");

        Self {
            index: page.index,
            title: page
                .title
                .as_deref()
                .map(|t| truncate_chars(t, SUMMARY_TITLE_CHARS)),
            header: truncate_chars(&header, SUMMARY_EDGE_CHARS),
            footer: truncate_chars(&footer, SUMMARY_EDGE_CHARS),
            excerpt: truncate_chars(&normalize_whitespace(&page.text), SUMMARY_EXCERPT_CHARS),
            detected_number: page.accepted_number(number_floor),
            section: page.section.as_ref().map(|s| s.label.clone()),
            section_number: page.section_number.as_ref().map(|n| n.label.clone()),
        }
    }
}

/// A candidate ordering returned by the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedOrder {
    /// Page indices in proposed reading order; validated by the engine.
    pub order: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    /// Self-reported confidence; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl ProposedOrder {
    pub fn new(order: Vec<usize>) -> Self {
        Self {
            order,
            document_type: None,
            confidence: None,
            rationale: None,
        }
    }
}

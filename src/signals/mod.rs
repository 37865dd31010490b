//! Per-page signal extraction.
//!
//! - [`page_number`]: header/footer page-number detection with a document-level plausibility
//!   pass and gap reporting.
//! - [`section`]: keyword classification against an ordered section catalogue, plus title,
//!   heading-number and blank-page detection.
//!
//! Candidate detection and classification are pure functions of the page text and may run in
//! parallel. Only the plausibility pass looks across pages, and it does so in original
//! (ingestion) order so its result never depends on the ordering being computed.

pub mod page_number;
pub mod section;

#[cfg(test)]
mod tests;

pub use page_number::{
    LinePosition, NumberCandidate, PageNumberExtractor, PatternFamily, detect_candidate,
    find_gaps, is_page_number_line, parse_roman,
};
pub use section::{
    DEFAULT_CATALOGUE, SectionClassifier, SectionEntry, detect_title, extract_section_number,
    is_blank_page,
};

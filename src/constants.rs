//! Cross-cutting, shared constants.
//!
//! Every tunable the engine exposes through [`crate::config::Config`] has its default here, so
//! the config layer, the signal extractors and the tests agree on one value.
//!
//! # Weight Invariant
//!
//! The three fusion weights must sum to `1.0` (within [`WEIGHT_SUM_EPSILON`]). The defaults
//! below satisfy this; [`crate::config::Config::validate`] rejects overrides that do not.

pub const DEFAULT_W_NUMBER: f64 = 0.6;
pub const DEFAULT_W_SECTION: f64 = 0.2;
pub const DEFAULT_W_CONTINUITY: f64 = 0.2;

/// Tolerance when checking that the fusion weights sum to one.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Coverage at or above which the numeric path is taken.
pub const DEFAULT_NUMBER_COVERAGE_THRESHOLD: f64 = 0.7;

/// Cosine similarity at or above which two pages are near-duplicates.
pub const DEFAULT_NEAR_DUPLICATE_THRESHOLD: f64 = 0.95;

/// Minimum confidence for a detected page number to count as accepted.
pub const DEFAULT_NUMBER_ACCEPTANCE_FLOOR: f64 = 0.5;

/// Minimum keyword score for a section label to be assigned.
pub const DEFAULT_SECTION_MATCH_FLOOR: f64 = 1.0;

/// Coverage below which the document is always escalated.
pub const DEFAULT_ESCALATION_COVERAGE_FLOOR: f64 = 0.3;

/// Fraction of pages lacking both number and section above which the document is escalated.
pub const DEFAULT_ESCALATION_UNLABELED_FRACTION: f64 = 0.5;

/// Upper bound on full passes of the adjacent-swap continuity refinement.
pub const DEFAULT_REFINEMENT_MAX_PASSES: u32 = 64;

pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: u64 = 4_096;

/// Minimum improvement for a refinement swap to count as strictly better.
pub const REFINEMENT_EPSILON: f64 = 1e-9;

/// Pages with fewer non-whitespace characters than this are treated as blank.
pub const BLANK_PAGE_MIN_CHARS: usize = 20;

/// Number of lines at each end of a page searched for page numbers.
pub const HEADER_FOOTER_LINES: usize = 3;

/// Largest value accepted as a page number.
pub const MAX_PAGE_NUMBER: u32 = 9_999;

/// Largest value accepted from a roman-numeral folio.
pub const MAX_ROMAN_PAGE_NUMBER: u32 = 50;

/// Added to schedule and annexure numbers so they sort after the numbered body sections.
pub const APPENDIX_SECTION_OFFSET: u32 = 1_000;

/// Characters of page text considered by the section classifier (in addition to the title).
pub const SECTION_SCAN_CHARS: usize = 500;

/// Length limits for the page summaries sent to the reasoning collaborator.
pub const SUMMARY_EXCERPT_CHARS: usize = 400;
pub const SUMMARY_EDGE_CHARS: usize = 200;
pub const SUMMARY_TITLE_CHARS: usize = 100;

/// A page moved by more than this many positions is listed as a major reordering.
pub const MAJOR_MOVE_DISTANCE: usize = 3;
pub const MAJOR_MOVES_SHOWN: usize = 5;

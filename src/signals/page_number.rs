use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::constants::{HEADER_FOOTER_LINES, MAX_PAGE_NUMBER, MAX_ROMAN_PAGE_NUMBER};
use crate::model::PageNumber;

/// Page-number pattern families, listed in precedence order.
///
/// Precedence only breaks ties between candidates of equal confidence on the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFamily {
    /// `Page 4 of 12`
    PageOfTotal,
    /// `4 of 12` on its own line
    OfTotal,
    /// `Page 4`
    PageLabel,
    /// `- 4 -`
    Dashed,
    /// `4/12` on its own line
    Fraction,
    /// `p. 4`
    Abbreviated,
    /// `iv` on its own line, lower-case only
    Roman,
    /// `4` on its own line
    Bare,
    /// Supplied by the caller rather than detected from text.
    Explicit,
}

impl PatternFamily {
    /// Detectable families in precedence order (highest first).
    pub const CATALOGUE: [PatternFamily; 8] = [
        PatternFamily::PageOfTotal,
        PatternFamily::OfTotal,
        PatternFamily::PageLabel,
        PatternFamily::Dashed,
        PatternFamily::Fraction,
        PatternFamily::Abbreviated,
        PatternFamily::Roman,
        PatternFamily::Bare,
    ];

    /// Intrinsic specificity in `(0, 1]`.
    pub fn specificity(self) -> f64 {
        match self {
            PatternFamily::PageOfTotal | PatternFamily::Explicit => 1.0,
            PatternFamily::OfTotal => 0.95,
            PatternFamily::PageLabel | PatternFamily::Dashed => 0.9,
            PatternFamily::Fraction => 0.85,
            PatternFamily::Abbreviated => 0.8,
            PatternFamily::Roman => 0.6,
            PatternFamily::Bare => 0.5,
        }
    }

    /// Lower is stronger.
    pub fn precedence(self) -> usize {
        Self::CATALOGUE
            .iter()
            .position(|f| *f == self)
            .unwrap_or(0)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatternFamily::PageOfTotal => "page_of_total",
            PatternFamily::OfTotal => "of_total",
            PatternFamily::PageLabel => "page_label",
            PatternFamily::Dashed => "dashed",
            PatternFamily::Fraction => "fraction",
            PatternFamily::Abbreviated => "abbreviated",
            PatternFamily::Roman => "roman",
            PatternFamily::Bare => "bare",
            PatternFamily::Explicit => "explicit",
        }
    }
}

impl std::fmt::Display for PatternFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct FamilyPattern {
    family: PatternFamily,
    regex: Regex,
}

// Capture 1 is the page value, capture 2 (when present) the declared total.
static PATTERNS: LazyLock<Vec<FamilyPattern>> = LazyLock::new(|| {
    let table: [(PatternFamily, &str); 8] = [
        (
            PatternFamily::PageOfTotal,
            r"(?i)\bpage\s+(\d{1,4})\s+of\s+(\d{1,4})\b",
        ),
        (
            PatternFamily::OfTotal,
            r"(?i)^\s*(\d{1,4})\s+of\s+(\d{1,4})\s*$",
        ),
        (PatternFamily::PageLabel, r"(?i)\bpage\s+(\d{1,4})\b"),
        (PatternFamily::Dashed, r"^\s*[-–—]\s*(\d{1,4})\s*[-–—]\s*$"),
        (PatternFamily::Fraction, r"^\s*(\d{1,4})\s*/\s*(\d{1,4})\s*$"),
        (PatternFamily::Abbreviated, r"(?i)(?:^|\s)pp?\.\s*(\d{1,4})\b"),
        (
            PatternFamily::Roman,
            r"^\s*(?:(?i:page)\s+)?([ivxlcdm]{1,12})\s*$",
        ),
        (PatternFamily::Bare, r"^\s*(\d{1,3})\s*$"),
    ];

    table
        .into_iter()
        .filter_map(|(family, pattern)| match Regex::new(pattern) {
            Ok(regex) => Some(FamilyPattern { family, regex }),
            Err(e) => {
                tracing::error!(family = %family, error = %e, "page number pattern failed to compile");
                None
            }
        })
        .collect()
});

/// Where in the header/footer scope a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePosition {
    /// Very first or very last non-empty line.
    Edge,
    /// Any other line of the header/footer scope.
    Inner,
}

impl LinePosition {
    pub fn factor(self) -> f64 {
        match self {
            LinePosition::Edge => 1.0,
            LinePosition::Inner => 0.9,
        }
    }
}

/// A page-number match before the document-level plausibility pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumberCandidate {
    pub value: u32,
    /// Total declared by `N of M` style patterns.
    pub total: Option<u32>,
    pub family: PatternFamily,
    pub position: LinePosition,
}

impl NumberCandidate {
    /// Specificity times layout position; plausibility is applied later.
    pub fn base_confidence(&self) -> f64 {
        self.family.specificity() * self.position.factor()
    }
}

/// Returns the first three and last three non-empty lines, each tagged with its position.
fn header_footer_scope(text: &str) -> Vec<(&str, LinePosition)> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let n = lines.len();
    if n == 0 {
        return Vec::new();
    }

    let mut positions: Vec<usize> = (0..n.min(HEADER_FOOTER_LINES)).collect();
    for i in n.saturating_sub(HEADER_FOOTER_LINES)..n {
        if !positions.contains(&i) {
            positions.push(i);
        }
    }

    positions
        .into_iter()
        .map(|i| {
            let position = if i == 0 || i == n - 1 {
                LinePosition::Edge
            } else {
                LinePosition::Inner
            };
            (lines[i], position)
        })
        .collect()
}

fn match_line(line: &str, position: LinePosition) -> Vec<NumberCandidate> {
    let mut found = Vec::new();

    for pattern in PATTERNS.iter() {
        let Some(caps) = pattern.regex.captures(line) else {
            continue;
        };
        let Some(raw) = caps.get(1) else {
            continue;
        };

        // Roman folios are lower-case front matter; upper-case runs are headings or words.
        let value = if pattern.family == PatternFamily::Roman {
            parse_roman(raw.as_str()).filter(|v| *v <= MAX_ROMAN_PAGE_NUMBER)
        } else {
            raw.as_str().parse::<u32>().ok()
        };
        let Some(value) = value.filter(|v| (1..=MAX_PAGE_NUMBER).contains(v)) else {
            continue;
        };

        let total = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        if let Some(total) = total
            && (value > total || total > MAX_PAGE_NUMBER)
        {
            continue;
        }

        found.push(NumberCandidate {
            value,
            total,
            family: pattern.family,
            position,
        });
    }

    found
}

/// `true` if the line on its own reads as a page-number marker.
pub fn is_page_number_line(line: &str) -> bool {
    !match_line(line.trim(), LinePosition::Edge).is_empty()
}

/// Finds the strongest page-number candidate in the page's header/footer scope.
///
/// Pure: depends on `text` only, so pages may be scanned in parallel.
pub fn detect_candidate(text: &str) -> Option<NumberCandidate> {
    let mut best: Option<NumberCandidate> = None;

    for (line, position) in header_footer_scope(text) {
        for candidate in match_line(line, position) {
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    let (a, b) = (candidate.base_confidence(), current.base_confidence());
                    let stronger = a > b
                        || (a == b && candidate.family.precedence() < current.family.precedence());
                    Some(if stronger { candidate } else { current })
                }
            };
        }
    }

    best
}

/// Running view of the numbers accepted so far in original page order.
#[derive(Debug, Clone, Default)]
struct PlausibilityContext {
    min: Option<u32>,
    max: Option<u32>,
    accepted: u32,
    declared_total: Option<u32>,
}

impl PlausibilityContext {
    const PENALTY: f64 = 0.5;
    const BASE_SLACK: u32 = 5;

    fn factor(&self, candidate: &NumberCandidate) -> f64 {
        if self
            .declared_total
            .is_some_and(|total| candidate.value > total)
        {
            return Self::PENALTY;
        }

        if let (Some(min), Some(max)) = (self.min, self.max) {
            let slack = self.accepted + Self::BASE_SLACK;
            if candidate.value.saturating_add(slack) < min || candidate.value > max + slack {
                return Self::PENALTY;
            }
        }

        1.0
    }

    fn observe(&mut self, candidate: &NumberCandidate) {
        self.min = Some(self.min.map_or(candidate.value, |m| m.min(candidate.value)));
        self.max = Some(self.max.map_or(candidate.value, |m| m.max(candidate.value)));
        self.accepted += 1;
        if let Some(total) = candidate.total {
            self.declared_total = Some(self.declared_total.map_or(total, |t| t.max(total)));
        }
    }
}

/// Turns raw page text into [`PageNumber`] signals for a whole document.
#[derive(Debug, Clone, Copy)]
pub struct PageNumberExtractor {
    acceptance_floor: f64,
}

impl PageNumberExtractor {
    pub fn new(acceptance_floor: f64) -> Self {
        Self { acceptance_floor }
    }

    pub fn acceptance_floor(&self) -> f64 {
        self.acceptance_floor
    }

    /// Applies the plausibility pass to candidates given in original page order.
    ///
    /// Only candidates whose final confidence reaches the floor feed the context for later
    /// pages, so the result is reproducible from the texts alone.
    pub fn score_candidates(&self, candidates: &[Option<NumberCandidate>]) -> Vec<Option<PageNumber>> {
        let mut context = PlausibilityContext::default();

        candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let candidate = candidate.as_ref()?;
                let plausibility = context.factor(candidate);
                let confidence = (candidate.base_confidence() * plausibility).clamp(0.0, 1.0);

                if confidence >= self.acceptance_floor {
                    context.observe(candidate);
                } else {
                    debug!(
                        page = index,
                        value = candidate.value,
                        family = %candidate.family,
                        confidence,
                        "page number below acceptance floor"
                    );
                }

                Some(PageNumber {
                    value: candidate.value,
                    confidence,
                    pattern: candidate.family,
                })
            })
            .collect()
    }

    /// Detects candidates in parallel, then scores them sequentially in input order.
    pub fn extract_all<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Option<PageNumber>> {
        let candidates: Vec<Option<NumberCandidate>> = texts
            .par_iter()
            .map(|t| detect_candidate(t.as_ref()))
            .collect();
        self.score_candidates(&candidates)
    }
}

/// Missing integers between accepted page numbers, ascending.
///
/// Empty when fewer than two numbers are given. Repeated numbers are ignored.
pub fn find_gaps(accepted: &[u32]) -> Vec<u32> {
    if accepted.len() < 2 {
        return Vec::new();
    }

    let mut sorted = accepted.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    sorted
        .windows(2)
        .flat_map(|w| (w[0] + 1)..w[1])
        .collect()
}

fn roman_digit(c: char) -> Option<u32> {
    match c.to_ascii_lowercase() {
        'i' => Some(1),
        'v' => Some(5),
        'x' => Some(10),
        'l' => Some(50),
        'c' => Some(100),
        'd' => Some(500),
        'm' => Some(1000),
        _ => None,
    }
}

fn to_roman(mut value: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];

    let mut out = String::new();
    for (n, s) in TABLE {
        while value >= n {
            out.push_str(s);
            value -= n;
        }
    }
    out
}

/// Parses a canonical roman numeral (`"xiv"` → 14). Non-canonical forms such as `"iiii"`
/// or words that happen to use roman letters (`"dim"`) are rejected.
pub fn parse_roman(s: &str) -> Option<u32> {
    let digits: Vec<u32> = s.chars().map(roman_digit).collect::<Option<_>>()?;
    if digits.is_empty() {
        return None;
    }

    let value = digits
        .iter()
        .enumerate()
        .fold(0i64, |acc, (i, d)| match digits.get(i + 1) {
            Some(next) if next > d => acc - i64::from(*d),
            _ => acc + i64::from(*d),
        });
    let value = u32::try_from(value).ok().filter(|v| *v > 0)?;

    (to_roman(value) == s.to_ascii_lowercase()).then_some(value)
}

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::page_number::{is_page_number_line, parse_roman};
use crate::constants::{
    APPENDIX_SECTION_OFFSET, BLANK_PAGE_MIN_CHARS, SECTION_SCAN_CHARS, SUMMARY_TITLE_CHARS,
};
use crate::model::{SectionNumber, SectionTag};

/// One catalogue row: a label, its expected document position and the phrases that signal it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionEntry {
    pub label: &'static str,
    /// Expected document position; lower comes earlier.
    pub rank: u32,
    pub keywords: &'static [&'static str],
}

/// Default catalogue, in expected document order.
///
/// Catalogue order doubles as the tie-break: when two labels score the same, the earlier row
/// wins.
pub const DEFAULT_CATALOGUE: &[SectionEntry] = &[
    SectionEntry {
        label: "front-matter",
        rank: 10,
        keywords: &[
            "table of contents",
            "contents",
            "abstract",
            "executive summary",
            "summary",
            "cover page",
            "title page",
        ],
    },
    SectionEntry {
        label: "introduction",
        rank: 100,
        keywords: &["introduction", "background", "overview", "scope", "preamble"],
    },
    SectionEntry {
        label: "definitions",
        rank: 200,
        keywords: &[
            "definitions",
            "interpretation",
            "whereas",
            "witnesseth",
            "recitals",
            "parties",
        ],
    },
    SectionEntry {
        label: "terms",
        rank: 300,
        keywords: &[
            "terms and conditions",
            "representations and warranties",
            "covenants",
            "indemnification",
            "termination",
            "dispute resolution",
            "governing law",
        ],
    },
    SectionEntry {
        label: "financial-terms",
        rank: 500,
        keywords: &[
            "loan amount",
            "principal amount",
            "interest rate",
            "payment terms",
            "disbursement",
            "repayment",
            "collateral",
        ],
    },
    SectionEntry {
        label: "miscellaneous",
        rank: 700,
        keywords: &["miscellaneous", "notices", "general provisions", "severability"],
    },
    SectionEntry {
        label: "schedules",
        rank: 800,
        keywords: &["schedule", "schedules", "attachment", "attachments"],
    },
    SectionEntry {
        label: "annexures",
        rank: 850,
        keywords: &[
            "annexure",
            "annexures",
            "annex",
            "appendix",
            "appendices",
            "exhibit",
        ],
    },
    SectionEntry {
        label: "signatures",
        rank: 900,
        keywords: &[
            "signatures",
            "signature",
            "signed",
            "witness",
            "in witness whereof",
            "executed",
        ],
    },
    SectionEntry {
        label: "end-matter",
        rank: 950,
        keywords: &[
            "conclusion",
            "references",
            "bibliography",
            "glossary",
            "abbreviations",
            "index",
        ],
    },
];

/// Lower-cases, replaces non-alphanumerics with spaces and pads with one space on each side,
/// so `" keyword "` containment is a whole-word phrase match.
fn normalize_for_match(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

fn prefix_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Keyword classifier over an ordered [`SectionEntry`] catalogue.
#[derive(Debug, Clone)]
pub struct SectionClassifier {
    catalogue: &'static [SectionEntry],
    match_floor: f64,
}

impl SectionClassifier {
    pub fn new(match_floor: f64) -> Self {
        Self::with_catalogue(DEFAULT_CATALOGUE, match_floor)
    }

    pub fn with_catalogue(catalogue: &'static [SectionEntry], match_floor: f64) -> Self {
        Self {
            catalogue,
            match_floor,
        }
    }

    pub fn catalogue(&self) -> &'static [SectionEntry] {
        self.catalogue
    }

    /// Maps a catalogue position into `(0, 1]`; the first entry maps to `1.0`.
    pub fn signal_for_position(&self, position: usize) -> f64 {
        let n = self.catalogue.len();
        if n == 0 || position >= n {
            return 0.0;
        }
        (n - position) as f64 / n as f64
    }

    /// Scores each catalogue entry against the page and returns the best label at or above
    /// the match floor.
    ///
    /// Only the title and the first few hundred characters are scanned. A phrase scores its
    /// word count, doubled when it also appears in the title.
    pub fn classify(&self, text: &str, title: Option<&str>) -> Option<SectionTag> {
        if is_blank_page(text) {
            return None;
        }

        let window = normalize_for_match(prefix_chars(text, SECTION_SCAN_CHARS));
        let title = title.map(normalize_for_match).unwrap_or_default();

        let mut best: Option<(usize, f64)> = None;
        for (position, entry) in self.catalogue.iter().enumerate() {
            let score: f64 = entry
                .keywords
                .iter()
                .map(|keyword| {
                    let needle = normalize_for_match(keyword);
                    let words = keyword.split_whitespace().count() as f64;
                    let mut s = 0.0;
                    if window.contains(&needle) {
                        s += words;
                    }
                    if title.contains(&needle) {
                        s += words;
                    }
                    s
                })
                .sum();

            // Strictly greater: earlier entries keep ties.
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((position, score));
            }
        }

        let (position, score) = best?;
        if score < self.match_floor {
            return None;
        }

        let entry = &self.catalogue[position];
        Some(SectionTag {
            label: entry.label.to_string(),
            rank: entry.rank,
            signal: self.signal_for_position(position),
            score,
        })
    }
}

/// `true` when the page has fewer than [`BLANK_PAGE_MIN_CHARS`] non-whitespace characters.
pub fn is_blank_page(text: &str) -> bool {
    text.chars().filter(|c| !c.is_whitespace()).count() < BLANK_PAGE_MIN_CHARS
}

static NUMBERED_HEADING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\d{1,2}(?:\.\d{1,2})*\.?|article\s+\w+|section\s+\w+|chapter\s+\w+)\s+\S")
        .ok()
});

const TITLE_SCAN_LINES: usize = 10;
const TITLE_MAX_CHARS: usize = 80;

fn is_heading_like(line: &str, isolated: bool) -> bool {
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 3 || line.chars().count() > TITLE_MAX_CHARS {
        return false;
    }
    if is_page_number_line(line) {
        return false;
    }

    let upper = letters.iter().all(|c| !c.is_lowercase());
    let numbered = NUMBERED_HEADING
        .as_ref()
        .is_some_and(|re| re.is_match(line));
    let unterminated = !line.ends_with(['.', ',', ';', ':']);

    upper || numbered || (isolated && unterminated)
}

/// Returns the first heading-like line among the opening lines of the page.
///
/// A line is heading-like when it is short and either upper-case, numbered
/// (`2.1 Scope`, `Article IV ...`) or isolated by blank lines. Page-number lines never count.
pub fn detect_title(text: &str) -> Option<String> {
    if is_blank_page(text) {
        return None;
    }

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut seen = 0;

    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        seen += 1;
        if seen > TITLE_SCAN_LINES {
            break;
        }

        let blank_before = i == 0 || lines[i - 1].is_empty();
        let blank_after = lines.get(i + 1).is_none_or(|l| l.is_empty());
        if is_heading_like(line, blank_before && blank_after) {
            return Some(prefix_chars(line, SUMMARY_TITLE_CHARS).to_string());
        }
    }

    None
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::error!(pattern, error = %e, "section number pattern failed to compile");
            None
        }
    }
}

/// `3`, `3.2`, `3.2.1` followed by the heading text.
static DOTTED_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^(\d{1,4}(?:\.\d{1,4}){0,3})\.?\s*\p{Lu}"));

/// `IV. Terms`, `II) Scope`, `III INTRODUCTION`.
static ROMAN_HEADING: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^([IVXLCDM]{1,8})(?:[.)]\s*\S|\s+\p{Lu})"));

static DIVISION_HEADING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(r"(?i)^(?:article|section|chapter|part)\s+(\d{1,4}(?:\.\d{1,4}){0,3}|[ivxlcdm]{1,8})\b")
});

/// `(a)`, `(3)`.
static ENUMERATED_HEADING: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?i)^\(([a-z]|\d{1,3})\)"));

static APPENDIX_HEADING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(r"(?i)^(?:schedule|annexure|annex|appendix)\s+(\d{1,4}|[ivxlcdm]{1,8})\b")
});

/// Roman numerals above this are read as words (`MIX`, `CD`), not heading numbers.
const ROMAN_HEADING_LIMIT: u32 = 100;

fn first_capture<'t>(regex: &Option<Regex>, text: &'t str) -> Option<&'t str> {
    let regex = regex.as_ref()?;
    regex.captures(text)?.get(1).map(|m| m.as_str())
}

fn dotted_key(raw: &str) -> Option<Vec<u32>> {
    raw.split('.').map(|part| part.parse().ok()).collect()
}

fn roman_number(raw: &str) -> Option<SectionNumber> {
    let value = parse_roman(raw).filter(|v| *v <= ROMAN_HEADING_LIMIT)?;
    Some(SectionNumber::new(raw.to_ascii_uppercase(), vec![value]))
}

fn dotted_or_roman(raw: &str) -> Option<SectionNumber> {
    if raw.starts_with(|c: char| c.is_ascii_digit()) {
        dotted_key(raw).map(|key| SectionNumber::new(raw, key))
    } else {
        roman_number(raw)
    }
}

/// Reads a heading number from the start of a page title.
///
/// Forms, tried in order:
/// - dotted decimals (`3.2.1 Attention`), keyed part by part
/// - upper-case roman numerals (`IV. Terms`)
/// - `Article`, `Section`, `Chapter` or `Part` with a decimal or roman number
/// - enumerations (`(a)` is 1, `(3)` is 3)
/// - `Schedule`, `Annexure`, `Annex` or `Appendix` with a decimal or roman number, offset by
///   [`APPENDIX_SECTION_OFFSET`] so they follow the body
pub fn extract_section_number(title: &str) -> Option<SectionNumber> {
    let title = title.trim();

    if let Some(number) = first_capture(&DOTTED_NUMBER, title).and_then(dotted_or_roman) {
        return Some(number);
    }
    if let Some(number) = first_capture(&ROMAN_HEADING, title).and_then(roman_number) {
        return Some(number);
    }
    if let Some(number) = first_capture(&DIVISION_HEADING, title).and_then(dotted_or_roman) {
        return Some(number);
    }
    if let Some(raw) = first_capture(&ENUMERATED_HEADING, title) {
        let value = match raw.parse::<u32>() {
            Ok(n) => Some(n),
            Err(_) => raw
                .chars()
                .next()
                .map(|c| u32::from(c.to_ascii_lowercase()) - u32::from('a') + 1),
        };
        if let Some(value) = value {
            return Some(SectionNumber::new(format!("({raw})"), vec![value]));
        }
    }

    let mut number = first_capture(&APPENDIX_HEADING, title).and_then(dotted_or_roman)?;
    if let Some(first) = number.key.first_mut() {
        *first += APPENDIX_SECTION_OFFSET;
    }
    Some(number)
}


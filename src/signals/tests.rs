use super::*;

const FLOOR: f64 = 0.5;

#[test]
fn test_page_of_total_in_footer() {
    let text = "Loan Agreement\n\nThe borrower agrees to the terms below.\n\nPage 3 of 10";

    let candidate = detect_candidate(text).unwrap();
    assert_eq!(candidate.value, 3);
    assert_eq!(candidate.total, Some(10));
    assert_eq!(candidate.family, PatternFamily::PageOfTotal);
    assert_eq!(candidate.position, LinePosition::Edge);
    assert_eq!(candidate.base_confidence(), 1.0);
}

#[test]
fn test_dashed_number() {
    let candidate = detect_candidate("Some body text\n- 7 -").unwrap();
    assert_eq!(candidate.value, 7);
    assert_eq!(candidate.family, PatternFamily::Dashed);
}

#[test]
fn test_bare_number_on_edge_line() {
    let candidate = detect_candidate("Some text about repayment\n\n42").unwrap();
    assert_eq!(candidate.value, 42);
    assert_eq!(candidate.family, PatternFamily::Bare);
    assert_eq!(candidate.base_confidence(), 0.5);
}

#[test]
fn test_bare_number_on_inner_line_scores_lower() {
    let text = "Heading\n12\nmore text\nmore text\nmore text\nclosing line";

    let candidate = detect_candidate(text).unwrap();
    assert_eq!(candidate.value, 12);
    assert_eq!(candidate.position, LinePosition::Inner);
    assert!((candidate.base_confidence() - 0.45).abs() < 1e-12);
}

#[test]
fn test_number_in_page_middle_is_out_of_scope() {
    let mut lines: Vec<String> = (0..10).map(|i| format!("paragraph line {i} text")).collect();
    lines[5] = "17".to_string();

    assert!(detect_candidate(&lines.join("\n")).is_none());
}

#[test]
fn test_value_above_declared_total_falls_back_to_page_label() {
    let candidate = detect_candidate("Body text\nPage 5 of 3").unwrap();
    assert_eq!(candidate.value, 5);
    assert_eq!(candidate.family, PatternFamily::PageLabel);
}

#[test]
fn test_zero_is_not_a_page_number() {
    assert!(detect_candidate("Body text\nPage 0").is_none());
    assert!(detect_candidate("Body text\n0").is_none());
}

#[test]
fn test_date_like_fraction_rejected() {
    assert!(detect_candidate("Body text\n12/05").is_none());
}

#[test]
fn test_roman_numeral_footer() {
    let candidate = detect_candidate("Preface text goes here\nxiv").unwrap();
    assert_eq!(candidate.value, 14);
    assert_eq!(candidate.family, PatternFamily::Roman);
}

#[test]
fn test_upper_case_roman_lines_are_not_page_numbers() {
    for line in ["MIX", "CD", "I", "Page XIV"] {
        let text = format!("Body text of the page\n{line}");
        assert!(detect_candidate(&text).is_none(), "{line}");
    }
}

#[test]
fn test_roman_folio_above_front_matter_range_rejected() {
    assert!(detect_candidate("Body text of the page\nmcmxc").is_none());
    assert!(detect_candidate("Body text of the page\nc").is_none());

    let candidate = detect_candidate("Body text of the page\npage l").unwrap();
    assert_eq!(candidate.value, 50);
    assert_eq!(candidate.family, PatternFamily::Roman);
}

#[test]
fn test_no_match_is_absent() {
    assert!(detect_candidate("No numbers here at all").is_none());
    assert!(detect_candidate("").is_none());
}

#[test]
fn test_equal_confidence_tie_uses_precedence() {
    let candidate = detect_candidate("Page 4\nbody text\n- 4 -").unwrap();
    assert_eq!(candidate.family, PatternFamily::PageLabel);
}

#[test]
fn test_precedence_order() {
    assert!(PatternFamily::PageOfTotal.precedence() < PatternFamily::Fraction.precedence());
    assert!(PatternFamily::Fraction.precedence() < PatternFamily::Bare.precedence());
    for pair in PatternFamily::CATALOGUE.windows(2) {
        assert!(pair[0].specificity() >= pair[1].specificity());
    }
}

#[test]
fn test_parse_roman() {
    assert_eq!(parse_roman("iv"), Some(4));
    assert_eq!(parse_roman("XIV"), Some(14));
    assert_eq!(parse_roman("mcmxc"), Some(1990));
    assert_eq!(parse_roman("iiii"), None);
    assert_eq!(parse_roman("dim"), None);
    assert_eq!(parse_roman(""), None);
}

#[test]
fn test_plausibility_penalizes_outlier() {
    let extractor = PageNumberExtractor::new(FLOOR);
    let numbers = extractor.extract_all(&["Page 1", "Page 2", "Page 500"]);

    assert_eq!(numbers[0].unwrap().confidence, 0.9);
    assert_eq!(numbers[1].unwrap().confidence, 0.9);

    let outlier = numbers[2].unwrap();
    assert_eq!(outlier.value, 500);
    assert!((outlier.confidence - 0.45).abs() < 1e-12);
    assert!(outlier.confidence < FLOOR);
}

#[test]
fn test_plausibility_penalizes_value_beyond_declared_total() {
    let extractor = PageNumberExtractor::new(FLOOR);
    let numbers = extractor.extract_all(&["Page 1 of 3", "Page 2 of 3", "Page 7"]);

    assert_eq!(numbers[0].unwrap().confidence, 1.0);
    assert!(numbers[2].unwrap().confidence < FLOOR);
}

#[test]
fn test_first_number_is_never_penalized() {
    let extractor = PageNumberExtractor::new(FLOOR);
    let numbers = extractor.extract_all(&["Page 400", "Page 2"]);

    assert_eq!(numbers[0].unwrap().confidence, 0.9);
}

#[test]
fn test_extract_all_is_deterministic() {
    let texts = ["Page 3 of 5", "intro text", "- 1 -", "Page 2", "iv", "Page 900"];
    let extractor = PageNumberExtractor::new(FLOOR);

    assert_eq!(extractor.extract_all(&texts), extractor.extract_all(&texts));
}

#[test]
fn test_unmatched_pages_stay_absent() {
    let extractor = PageNumberExtractor::new(FLOOR);
    let numbers = extractor.extract_all(&["Page 1", "nothing to see", "Page 3"]);

    assert!(numbers[1].is_none());
    assert_eq!(numbers[2].unwrap().value, 3);
}

#[test]
fn test_find_gaps() {
    assert_eq!(find_gaps(&[1, 2, 5, 7]), vec![3, 4, 6]);
    assert_eq!(find_gaps(&[7, 5, 1, 2]), vec![3, 4, 6]);
    assert_eq!(find_gaps(&[3, 3, 5]), vec![4]);
}

#[test]
fn test_find_gaps_needs_two_numbers() {
    assert!(find_gaps(&[]).is_empty());
    assert!(find_gaps(&[4]).is_empty());
}

#[test]
fn test_is_page_number_line() {
    assert!(is_page_number_line("Page 3 of 10"));
    assert!(is_page_number_line("  - 12 -  "));
    assert!(!is_page_number_line("DEFINITIONS"));
}

#[test]
fn test_classify_title_keyword() {
    let text = "DEFINITIONS\n\n1.1 \"Agreement\" means this loan agreement and its schedules.";
    let title = detect_title(text);
    assert_eq!(title.as_deref(), Some("DEFINITIONS"));

    let tag = SectionClassifier::new(1.0)
        .classify(text, title.as_deref())
        .unwrap();
    assert_eq!(tag.label, "definitions");
    assert_eq!(tag.rank, 200);
    assert_eq!(tag.score, 2.0);
}

#[test]
fn test_classify_annexure_beats_body_mention() {
    let text = "ANNEXURE A\nList of collateral securities provided by the borrower";
    let title = detect_title(text);

    let tag = SectionClassifier::new(1.0)
        .classify(text, title.as_deref())
        .unwrap();
    assert_eq!(tag.label, "annexures");
}

#[test]
fn test_classify_tie_prefers_earlier_entry() {
    let text = "See the schedule and the appendix for further details.";

    let tag = SectionClassifier::new(1.0).classify(text, None).unwrap();
    assert_eq!(tag.label, "schedules");
}

#[test]
fn test_classify_below_floor_is_absent() {
    let text = "See the schedule for the remaining repayment details.";

    assert!(SectionClassifier::new(3.0).classify(text, None).is_none());
}

#[test]
fn test_classify_requires_whole_words() {
    let text = "The documents annexed hereto are binding on the borrower.";

    assert!(SectionClassifier::new(1.0).classify(text, None).is_none());
}

#[test]
fn test_classify_ignores_text_past_scan_window() {
    let text = format!("{}annexure", "x ".repeat(300));

    assert!(SectionClassifier::new(1.0).classify(&text, None).is_none());
}

#[test]
fn test_classify_blank_page_is_absent() {
    assert!(SectionClassifier::new(0.0).classify("index", None).is_none());
}

#[test]
fn test_section_signal_by_catalogue_position() {
    let classifier = SectionClassifier::new(1.0);
    let n = classifier.catalogue().len();

    assert_eq!(classifier.signal_for_position(0), 1.0);
    assert_eq!(classifier.signal_for_position(n - 1), 1.0 / n as f64);
    assert_eq!(classifier.signal_for_position(n), 0.0);
}

#[test]
fn test_catalogue_ranks_ascend() {
    for pair in DEFAULT_CATALOGUE.windows(2) {
        assert!(pair[0].rank < pair[1].rank);
    }
}

#[test]
fn test_detect_title_numbered_heading() {
    let text = "this first line is an ordinary lowercase sentence that ends.\n2.1 Scope of Work\nThe contractor shall deliver the goods.";

    assert_eq!(detect_title(text).as_deref(), Some("2.1 Scope of Work"));
}

#[test]
fn test_detect_title_skips_page_number_line() {
    let text = "Page 3 of 10\nINTRODUCTION\nThis agreement is made between the parties.";

    assert_eq!(detect_title(text).as_deref(), Some("INTRODUCTION"));
}

#[test]
fn test_detect_title_blank_page() {
    assert!(detect_title("  \n ").is_none());
}

#[test]
fn test_is_blank_page() {
    assert!(is_blank_page(""));
    assert!(is_blank_page("   \n\t  "));
    assert!(is_blank_page("short note"));
    assert!(!is_blank_page("This page has plenty of text on it."));
}

fn heading_key(title: &str) -> Option<Vec<u32>> {
    extract_section_number(title).map(|n| n.key)
}

#[test]
fn test_dotted_heading_numbers_sort_hierarchically() {
    let titles = ["4 Results", "3.2.1 Scaled Attention", "3 Model", "3.10 Training", "3.2 Attention"];
    let mut keyed: Vec<(Vec<u32>, &str)> = titles
        .iter()
        .map(|t| (heading_key(t).unwrap(), *t))
        .collect();
    keyed.sort();

    let order: Vec<&str> = keyed.into_iter().map(|(_, t)| t).collect();
    assert_eq!(
        order,
        vec!["3 Model", "3.2 Attention", "3.2.1 Scaled Attention", "3.10 Training", "4 Results"]
    );
    assert_eq!(extract_section_number("2.1Scope").unwrap().label, "2.1");
    assert_eq!(heading_key("1. Introduction"), Some(vec![1]));
}

#[test]
fn test_roman_and_division_headings() {
    let roman = extract_section_number("IV. Covenants").unwrap();
    assert_eq!((roman.label.as_str(), roman.key), ("IV", vec![4]));

    assert_eq!(heading_key("ARTICLE IX Termination"), Some(vec![9]));
    assert_eq!(heading_key("Article iv"), Some(vec![4]));
    assert_eq!(heading_key("Section 12"), Some(vec![12]));
    assert_eq!(heading_key("Chapter 2.3 Methods"), Some(vec![2, 3]));
}

#[test]
fn test_enumerated_headings() {
    assert_eq!(extract_section_number("(a) the borrower").unwrap().label, "(a)");
    assert_eq!(heading_key("(c) interest"), Some(vec![3]));
    assert_eq!(heading_key("(12) notices"), Some(vec![12]));
}

#[test]
fn test_schedules_follow_body_sections() {
    assert_eq!(heading_key("Schedule 2"), Some(vec![1_002]));
    assert_eq!(heading_key("ANNEXURE III"), Some(vec![1_003]));
    assert!(heading_key("Schedule 2").unwrap() > heading_key("99 Closing").unwrap());
}

#[test]
fn test_words_are_not_heading_numbers() {
    assert!(extract_section_number("DEFINITIONS").is_none());
    assert!(extract_section_number("IN WITNESS WHEREOF").is_none());
    assert!(extract_section_number("MIX AND MATCH").is_none());
    assert!(extract_section_number("ANNEXURE A").is_none());
    assert!(extract_section_number("").is_none());
}

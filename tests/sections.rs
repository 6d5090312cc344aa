//! Integration tests for section extraction.
//!
//! Everything here is offline: label maps are supplied directly, the way the
//! `extract` subcommand does it.

use mdslice::section::{extract, extract_all, find_heading, section_end, Document, LabelMap};
use mdslice::{slice_file_with_labels, slice_text, ExtractError, SliceConfig};

// ── Test helpers ─────────────────────────────────────────────────────────────

const PAPER: &str = "\
# Attention Is What You Need

Abstract text.

# 1. Introduction
Motivation.

# 2 Method
Overview of the method.

# 2.1 Setup
Hyper-parameters.

## 2.1.1 Data
Corpus statistics.

![](figs/arch.png)

# 3 Results
Numbers.

## 3.1 Ablations
More numbers.

# 4 Conclusion
Closing words.";

fn labels() -> LabelMap {
    LabelMap::parse(
        "Introduction: 1 Introduction\n\
         Methods: 2 Method\n\
         Experiments: Results\n\
         Conclusion: Conclusion",
    )
}

// ── Boundary scan ────────────────────────────────────────────────────────────

#[test]
fn same_depth_dotted_child_stays_in_section() {
    let doc = Document::new(PAPER);
    let methods = extract(&doc, "Methods", "2 Method").unwrap();

    assert!(methods.content.starts_with("# 2 Method"));
    assert!(methods.content.contains("# 2.1 Setup"));
    assert!(methods.content.contains("## 2.1.1 Data"));
    assert!(methods.content.contains("![](figs/arch.png)"));
    assert!(!methods.content.contains("# 3 Results"));
}

#[test]
fn deeper_headings_stay_and_shallower_or_sibling_stop() {
    let doc = Document::new(PAPER);
    let results = extract(&doc, "Experiments", "Results").unwrap();
    assert_eq!(
        results.content,
        "# 3 Results\nNumbers.\n\n## 3.1 Ablations\nMore numbers.\n"
    );
}

#[test]
fn last_section_runs_to_end_of_document() {
    let doc = Document::new(PAPER);
    let conclusion = extract(&doc, "Conclusion", "Conclusion").unwrap();
    assert_eq!(conclusion.end_line, doc.len());
    assert_eq!(conclusion.content, "# 4 Conclusion\nClosing words.");
}

#[test]
fn unrelated_number_at_same_depth_stops() {
    let doc = Document::new("# 2 Method\na\n# 20 Appendix\nb");
    let s = extract(&doc, "Methods", "Method").unwrap();
    assert_eq!(s.content, "# 2 Method\na");
}

#[test]
fn unnumbered_same_depth_heading_stops() {
    let doc = Document::new("## Method\na\n## Results\nb\n# Tail");
    let s = extract(&doc, "Methods", "Method").unwrap();
    assert_eq!(s.content, "## Method\na");
}

#[test]
fn section_is_exact_line_slice() {
    let doc = Document::new(PAPER);
    for result in extract_all(&doc, &labels()) {
        let section = result.unwrap();
        let expected = doc.lines()[section.start_line..section.end_line].join("\n");
        assert_eq!(section.content, expected, "label {}", section.label);
        assert!(section.line_count() >= 1);
    }
}

/// Cut `text` into consecutive sections, each starting where the previous
/// one ended, and glue them back together.
fn rejoin_sections(text: &str) -> String {
    let doc = Document::new(text);
    let mut pieces = Vec::new();
    let mut start = doc
        .headings()
        .next()
        .map(|h| h.line_index)
        .unwrap_or(doc.len());
    if start > 0 {
        pieces.push(doc.lines()[..start].join("\n"));
    }

    while let Some(heading) = doc.headings().find(|h| h.line_index == start) {
        let end = section_end(&doc, &heading);
        assert!(end > start, "section at line {start} is empty");
        pieces.push(doc.lines()[start..end].join("\n"));
        start = end;
    }
    assert_eq!(start, doc.len(), "sections stop short of the end");
    pieces.join("\n")
}

#[test]
fn top_level_sections_rejoin_to_input() {
    let text = "# 1 A\nx\n# 2 B\n## 2.1 C\ny\n# 3 D\nz\n";
    let doc = Document::new(text);
    let tops: Vec<_> = doc.headings().filter(|h| h.level == 1).collect();
    assert_eq!(tops.len(), 3);

    let pieces: Vec<String> = tops
        .iter()
        .map(|h| doc.lines()[h.line_index..section_end(&doc, h)].join("\n"))
        .collect();
    assert_eq!(pieces[1], "# 2 B\n## 2.1 C\ny");
    assert_eq!(pieces.join("\n"), text);
    assert_eq!(extract(&doc, "Last", "3 D").unwrap().content, "# 3 D\nz\n");
}

#[test]
fn consecutive_sections_cover_the_whole_document() {
    assert_eq!(rejoin_sections(PAPER), PAPER);
    let trailing = format!("{PAPER}\n");
    assert_eq!(rejoin_sections(&trailing), trailing);
    let preamble = format!("front matter\n\n{PAPER}");
    assert_eq!(rejoin_sections(&preamble), preamble);
}

#[test]
fn extraction_is_idempotent() {
    let doc = Document::new(PAPER);
    let first = extract(&doc, "Methods", "2 Method").unwrap();
    let second = extract(&doc, "Methods", "2 Method").unwrap();
    assert_eq!(first, second);
}

// ── Title matching ───────────────────────────────────────────────────────────

#[test]
fn numberless_match_bridges_number_styles() {
    let doc = Document::new(PAPER);
    // "1 Introduction" vs heading "1. Introduction": neither exact nor substring.
    let h = find_heading(&doc, "1 Introduction").unwrap();
    assert_eq!(h.title, "1. Introduction");
}

#[test]
fn matching_is_case_insensitive() {
    let doc = Document::new(PAPER);
    assert_eq!(find_heading(&doc, "RESULTS").unwrap().title, "3 Results");
}

#[test]
fn first_heading_in_document_order_wins() {
    // "Method" is a substring of the first heading and an exact match of the
    // second; the earlier heading is taken.
    let doc = Document::new("# Methodology overview\nx\n# Method\ny");
    assert_eq!(find_heading(&doc, "Method").unwrap().line_index, 0);
}

#[test]
fn blank_and_unknown_titles_are_reported() {
    let doc = Document::new(PAPER);
    assert_eq!(
        extract(&doc, "Related", "  "),
        Err(ExtractError::EmptyTitle {
            label: "Related".into()
        })
    );
    assert_eq!(
        extract(&doc, "Related", "Related Work"),
        Err(ExtractError::NotFound {
            label: "Related".into(),
            title: "Related Work".into()
        })
    );
}

#[test]
fn empty_document_finds_nothing() {
    let doc = Document::new("");
    let results = extract_all(&doc, &labels());
    assert_eq!(results.len(), 4);
    assert!(results
        .iter()
        .all(|r| matches!(r, Err(ExtractError::NotFound { .. }))));
}

#[test]
fn non_heading_lines_never_match() {
    let doc = Document::new("Results are below.\n# 3 Results\nx");
    assert_eq!(find_heading(&doc, "Results").unwrap().line_index, 1);
}

// ── Label maps and driver ────────────────────────────────────────────────────

#[test]
fn label_map_last_occurrence_wins() {
    let map = LabelMap::parse("Methods: Method\nnoise line\nMethods: 2 Method\n: orphan");
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("Methods"), Some("2 Method"));
}

#[test]
fn one_missing_label_does_not_block_others() {
    let mut map = labels();
    map.insert("Appendix", "Supplementary Material");
    let out = slice_text(PAPER, &map);
    assert_eq!(out.sections.len(), 4);
    assert_eq!(out.missing.len(), 1);
    assert_eq!(out.missing[0].label(), "Appendix");
}

#[tokio::test]
async fn slice_file_writes_one_file_per_label() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("attention.md");
    std::fs::write(&input, PAPER).unwrap();

    let config = SliceConfig::builder()
        .output_dir(dir.path().join("sections"))
        .build()
        .unwrap();
    let report = slice_file_with_labels(&input, &labels(), &config)
        .await
        .unwrap();

    assert!(report.is_complete());
    let names: Vec<String> = report
        .files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "attention_Introduction.md",
            "attention_Methods.md",
            "attention_Experiments.md",
            "attention_Conclusion.md"
        ]
    );

    let methods = std::fs::read_to_string(dir.path().join("sections/attention_Methods.md")).unwrap();
    assert!(methods.starts_with("# 2 Method"));
    assert!(!methods.contains("# 3 Results"));
}

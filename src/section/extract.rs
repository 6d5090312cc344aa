//! Heading-subtree extraction.
//!
//! A section runs from its heading line up to, not including, the next
//! heading that is not a structural descendant. Descendant-ness is decided
//! from the `#` depth first and, at equal depth, from the dotted section
//! numbers: authors frequently tag `2.1 Setup` with the same depth as
//! `2 Method`, and the numbering is then the only reliable signal.
//!
//! When two equal-depth headings cannot be compared by number (either side
//! unnumbered) the scan stops there.

use super::heading::Heading;
use super::labels::LabelMap;
use super::matcher::{find_first, matchers_for};
use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// A document as an ordered sequence of lines.
///
/// Lines are split on `\n` only, so joining them back with `\n` reproduces
/// the input byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Document<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
        }
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    /// Heading lines in document order.
    pub fn headings(&self) -> impl Iterator<Item = Heading<'a>> + '_ {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| Heading::parse(line, i))
    }

    /// Lines `start..end` joined with `\n`.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.lines.len());
        let start = start.min(end);
        self.lines[start..end].join("\n")
    }
}

/// The contiguous line range of one heading's subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSection {
    /// Category label from the classifier, e.g. `Introduction`.
    pub label: String,
    /// The matched heading's text.
    pub title: String,
    /// Line index of the heading.
    pub start_line: usize,
    /// Exclusive end line index.
    pub end_line: usize,
    /// `document[start_line..end_line]` joined with `\n`.
    pub content: String,
}

impl ExtractedSection {
    /// Number of lines in the section.
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// How a later heading relates to the section start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    /// Shallower heading: the section is closed.
    Ancestor,
    /// Same depth, not numbered as a descendant: the section is closed.
    Sibling,
    /// Deeper heading, or same depth numbered as a descendant.
    Descendant,
}

fn relation(start: &Heading<'_>, candidate: &Heading<'_>) -> Relation {
    use std::cmp::Ordering;

    match candidate.level.cmp(&start.level) {
        Ordering::Less => Relation::Ancestor,
        Ordering::Greater => Relation::Descendant,
        Ordering::Equal if start.has_numbered_descendant(candidate) => Relation::Descendant,
        Ordering::Equal => {
            if start.number.is_none() || candidate.number.is_none() {
                debug!(
                    "Line {}: '{}' has no comparable number, treating as sibling",
                    candidate.line_index + 1,
                    candidate.title
                );
            }
            Relation::Sibling
        }
    }
}

/// Exclusive end line of the section that starts at `start`.
pub fn section_end(document: &Document<'_>, start: &Heading<'_>) -> usize {
    for candidate in document.headings().skip_while(|h| h.line_index <= start.line_index) {
        match relation(start, &candidate) {
            Relation::Descendant => {
                trace!("Line {}: nested '{}'", candidate.line_index + 1, candidate.title);
            }
            stop => {
                debug!(
                    "Section '{}' ends at line {} ({:?} '{}')",
                    start.title,
                    candidate.line_index + 1,
                    stop,
                    candidate.title
                );
                return candidate.line_index;
            }
        }
    }
    document.len()
}

/// Locate the heading for `title_hint`.
pub fn find_heading<'a>(document: &Document<'a>, title_hint: &str) -> Option<Heading<'a>> {
    let matchers = matchers_for(title_hint);
    let (heading, how) = find_first(document.headings(), &matchers)?;
    debug!(
        "'{}' matched line {} '{}' ({} match)",
        title_hint,
        heading.line_index + 1,
        heading.title,
        how
    );
    Some(heading)
}

/// Extract the section for `label`, whose classifier title is `title_hint`.
pub fn extract(
    document: &Document<'_>,
    label: &str,
    title_hint: &str,
) -> Result<ExtractedSection, ExtractError> {
    if title_hint.trim().is_empty() {
        return Err(ExtractError::EmptyTitle {
            label: label.to_string(),
        });
    }

    let start = find_heading(document, title_hint).ok_or_else(|| ExtractError::NotFound {
        label: label.to_string(),
        title: title_hint.to_string(),
    })?;

    let end_line = section_end(document, &start);

    Ok(ExtractedSection {
        label: label.to_string(),
        title: start.title.to_string(),
        start_line: start.line_index,
        end_line,
        content: document.slice(start.line_index, end_line),
    })
}

/// Extract every label of `labels`, in map order.
///
/// One result per label; a missing label is logged and returned as an
/// error without affecting the others.
pub fn extract_all(
    document: &Document<'_>,
    labels: &LabelMap,
) -> Vec<Result<ExtractedSection, ExtractError>> {
    labels
        .iter()
        .map(|(label, title)| {
            let result = extract(document, label, title);
            if let Err(ref e) = result {
                warn!("{}", e);
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER: &str = "\
# Title
intro text
# 1 Introduction
why
# 2 Method
some text
# 2.1 Setup
details
## 2.1.1 Data
rows
# 3 Results
numbers
# 4 Conclusion
bye";

    #[test]
    fn same_depth_numbered_child_is_included() {
        let doc = Document::new(PAPER);
        let s = extract(&doc, "Methods", "2 Method").unwrap();
        assert_eq!(s.start_line, 4);
        assert_eq!(s.end_line, 10);
        assert!(s.content.starts_with("# 2 Method"));
        assert!(s.content.ends_with("rows"));
        assert!(!s.content.contains("3 Results"));
    }

    #[test]
    fn last_section_runs_to_end() {
        let doc = Document::new(PAPER);
        let s = extract(&doc, "Conclusion", "4 Conclusion").unwrap();
        assert_eq!(s.end_line, doc.len());
        assert_eq!(s.content, "# 4 Conclusion\nbye");
    }

    #[test]
    fn subsection_extracts_only_its_subtree() {
        let doc = Document::new(PAPER);
        let s = extract(&doc, "Setup", "2.1 Setup").unwrap();
        assert_eq!(s.content, "# 2.1 Setup\ndetails\n## 2.1.1 Data\nrows");
    }

    #[test]
    fn unnumbered_headings_fall_back_to_depth() {
        let doc = Document::new("# Method\ntext\n# Setup\nmore\n## Detail\n# Results");
        let s = extract(&doc, "Methods", "Method").unwrap();
        assert_eq!(s.content, "# Method\ntext");
        let s = extract(&doc, "Setup", "Setup").unwrap();
        assert_eq!(s.content, "# Setup\nmore\n## Detail");
    }

    #[test]
    fn numbered_only_on_one_side_stops() {
        let doc = Document::new("# 2 Method\ntext\n# Appendix\nmore");
        let s = extract(&doc, "Methods", "2 Method").unwrap();
        assert_eq!(s.end_line, 2);
    }

    #[test]
    fn ancestor_heading_stops() {
        let doc = Document::new("# Part\n## 1 Intro\nx\n## 1.1 More\ny\n# Part Two\nz");
        let s = extract(&doc, "Introduction", "1 Intro").unwrap();
        assert_eq!(s.content, "## 1 Intro\nx\n## 1.1 More\ny");
    }

    #[test]
    fn empty_document_is_not_found() {
        let doc = Document::new("");
        assert!(doc.is_empty());
        let err = extract(&doc, "Introduction", "Introduction").unwrap_err();
        assert!(matches!(err, ExtractError::NotFound { .. }));
    }

    #[test]
    fn blank_title_is_rejected() {
        let doc = Document::new(PAPER);
        assert_eq!(
            extract(&doc, "Methods", "  ").unwrap_err(),
            ExtractError::EmptyTitle {
                label: "Methods".into()
            }
        );
    }

    #[test]
    fn slice_clamps_out_of_range() {
        let doc = Document::new("a\nb");
        assert_eq!(doc.slice(1, 10), "b");
        assert_eq!(doc.slice(5, 10), "");
    }
}

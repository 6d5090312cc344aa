//! Page-marker splitting.
//!
//! Documents produced page by page (one VLM call per page, for instance)
//! carry a marker line at the top of each page, `# 页 12` by default. This
//! splitter cuts the document at every marker line and numbers each chunk
//! from its marker, falling back to the chunk position when text precedes
//! the first marker.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Marker prefix used by the page-by-page converter: `# 页 <n>`.
pub const DEFAULT_PAGE_MARKER: &str = "# 页 ";

static DEFAULT_SPLITTER: Lazy<PageSplitter> = Lazy::new(|| PageSplitter::new(DEFAULT_PAGE_MARKER));

/// One page of a split document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Number taken from the marker, or the 1-based chunk position.
    pub number: usize,
    /// Page text, trimmed.
    pub content: String,
}

/// Splits text on lines starting with a marker prefix followed by a number.
#[derive(Debug, Clone)]
pub struct PageSplitter {
    marker: String,
    re: Regex,
}

impl PageSplitter {
    pub fn new(marker: &str) -> Self {
        let re = Regex::new(&format!(r"(?m)^{}(\d+)", regex::escape(marker)))
            .expect("escaped marker is a valid pattern");
        Self {
            marker: marker.to_string(),
            re,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// The marker without `#` and whitespace, used in output file names
    /// (`"# 页 "` → `"页"`). Falls back to `"page"` for symbol-only markers.
    pub fn file_word(&self) -> &str {
        let word = self.marker.trim_matches(|c: char| c == '#' || c.is_whitespace());
        if word.is_empty() {
            "page"
        } else {
            word
        }
    }

    /// Split `text` into pages, dropping blank chunks.
    pub fn split(&self, text: &str) -> Vec<Page> {
        let mut cuts: Vec<usize> = self.re.find_iter(text).map(|m| m.start()).collect();
        cuts.push(text.len());

        let mut pages = Vec::with_capacity(cuts.len());
        let mut from = 0;
        for (position, &to) in cuts.iter().enumerate() {
            let chunk = &text[from..to];
            from = to;

            let content = chunk.trim();
            if content.is_empty() {
                continue;
            }

            let number = self
                .re
                .captures(chunk)
                .filter(|caps| caps.get(0).is_some_and(|m| m.start() == 0))
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(position + 1);

            pages.push(Page {
                number,
                content: content.to_string(),
            });
        }
        pages
    }
}

impl Default for PageSplitter {
    fn default() -> Self {
        DEFAULT_SPLITTER.clone()
    }
}

/// Split `text` on the default `# 页 <n>` markers.
pub fn split_pages(text: &str) -> Vec<Page> {
    DEFAULT_SPLITTER.split(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_default_marker() {
        let text = "# 页 1\nfirst\n\n# 页 2\nsecond\n# 页 3\nthird\n";
        let pages = split_pages(text);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[0].content, "# 页 1\nfirst");
        assert_eq!(pages[2].content, "# 页 3\nthird");
    }

    #[test]
    fn preamble_uses_position() {
        let text = "cover text\n# 页 7\nbody";
        let pages = split_pages(text);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[0].content, "cover text");
        assert_eq!(pages[1].number, 7);
    }

    #[test]
    fn marker_must_start_a_line() {
        let pages = split_pages("see # 页 2 inline\n# 页 3\nx");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].content, "see # 页 2 inline");
        assert_eq!(pages[1].number, 3);
    }

    #[test]
    fn custom_marker() {
        let splitter = PageSplitter::new("## Page ");
        assert_eq!(splitter.file_word(), "Page");
        let pages = splitter.split("## Page 1\na\n## Page 2\nb");
        assert_eq!(pages.iter().map(|p| p.number).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(PageSplitter::new("## ").file_word(), "page");
    }

    #[test]
    fn blank_document_has_no_pages() {
        assert!(split_pages("  \n\n").is_empty());
    }
}

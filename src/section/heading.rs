//! Heading detection for Markdown-style `#` headings.
//!
//! Headings are derived on the fly from document lines; nothing is cached.
//! A line is a heading when, after any leading whitespace, it starts with one
//! or more `#` characters followed by non-empty text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Dotted-decimal section number at the start of a heading title: `2`, `2.3`, `10.1.4`.
static RE_SECTION_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)*").unwrap());

/// Leading numeric token plus the whitespace after it: `2 `, `2.3 `, `3. `.
static RE_NUMBER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)*\.?\s+").unwrap());

/// A heading line of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading<'a> {
    /// Number of leading `#` characters.
    pub level: usize,
    /// Dotted numeric prefix of the title, if any.
    pub number: Option<&'a str>,
    /// Heading text without `#` markers and surrounding whitespace.
    pub title: &'a str,
    /// 0-based line index in the document.
    pub line_index: usize,
}

impl<'a> Heading<'a> {
    /// Parse `line` as a heading. Returns `None` for non-heading lines.
    pub fn parse(line: &'a str, line_index: usize) -> Option<Self> {
        let trimmed = line.trim_start();
        let level = trimmed.bytes().take_while(|&b| b == b'#').count();
        if level == 0 {
            return None;
        }

        let title = trimmed[level..].trim();
        if title.is_empty() {
            return None;
        }

        Some(Self {
            level,
            number: section_number(title),
            title,
            line_index,
        })
    }

    /// The title with its leading numeric token removed (`"2.1 Setup"` → `"Setup"`).
    pub fn title_without_number(&self) -> &'a str {
        strip_number_token(self.title).unwrap_or(self.title)
    }

    /// Whether `other` is numbered as a strict dotted-decimal descendant of
    /// this heading (`2` → `2.1`, `2.1.3`; not `2`, `20`, `3.1`).
    ///
    /// Always `false` when either heading is unnumbered.
    pub fn has_numbered_descendant(&self, other: &Heading<'_>) -> bool {
        match (self.number, other.number) {
            (Some(parent), Some(child)) => is_dotted_descendant(parent, child),
            _ => false,
        }
    }
}

/// Extract the dotted-decimal number at the start of a heading title.
pub fn section_number(title: &str) -> Option<&str> {
    RE_SECTION_NUMBER.find(title).map(|m| m.as_str())
}

/// Strip a leading numeric token followed by whitespace.
///
/// Returns `None` when `text` does not start with such a token.
pub fn strip_number_token(text: &str) -> Option<&str> {
    RE_NUMBER_TOKEN
        .find(text)
        .map(|m| text[m.end()..].trim())
}

/// `child` begins with `parent` followed by a literal `.`.
pub fn is_dotted_descendant(parent: &str, child: &str) -> bool {
    child
        .strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('.'))
}

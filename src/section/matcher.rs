//! Title matchers: decide whether a heading is the one a classifier title names.
//!
//! Classifier titles are free text and rarely reproduce a heading verbatim,
//! so three strategies are tried for every heading, in this order:
//!
//! 1. [`ExactTitle`]: the heading title equals the hint.
//! 2. [`ContainsTitle`]: the heading title contains the hint.
//! 3. [`NumberlessTitle`]: the hint starts with a section number
//!    (`"1 Introduction"`); both sides are compared with their numbers removed.
//!
//! All comparisons are case-insensitive.

use super::heading::{strip_number_token, Heading};

/// One title-matching strategy.
pub trait TitleMatcher: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether `heading` satisfies this strategy.
    fn try_match(&self, heading: &Heading<'_>) -> bool;
}

/// Heading title equals the hint.
#[derive(Debug, Clone)]
pub struct ExactTitle {
    needle: String,
}

impl ExactTitle {
    pub fn new(hint: &str) -> Self {
        Self {
            needle: hint.trim().to_lowercase(),
        }
    }
}

impl TitleMatcher for ExactTitle {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn try_match(&self, heading: &Heading<'_>) -> bool {
        heading.title.to_lowercase() == self.needle
    }
}

/// Heading title contains the hint anywhere.
#[derive(Debug, Clone)]
pub struct ContainsTitle {
    needle: String,
}

impl ContainsTitle {
    pub fn new(hint: &str) -> Self {
        Self {
            needle: hint.trim().to_lowercase(),
        }
    }
}

impl TitleMatcher for ContainsTitle {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn try_match(&self, heading: &Heading<'_>) -> bool {
        heading.title.to_lowercase().contains(&self.needle)
    }
}

/// Hint and heading compared with their leading section numbers stripped.
#[derive(Debug, Clone)]
pub struct NumberlessTitle {
    needle: String,
}

impl NumberlessTitle {
    /// Returns `None` when the hint carries no leading numeric token, in which
    /// case this strategy cannot add anything over [`ExactTitle`].
    pub fn new(hint: &str) -> Option<Self> {
        let stripped = strip_number_token(hint.trim())?;
        if stripped.is_empty() {
            return None;
        }
        Some(Self {
            needle: stripped.to_lowercase(),
        })
    }
}

impl TitleMatcher for NumberlessTitle {
    fn name(&self) -> &'static str {
        "numberless"
    }

    fn try_match(&self, heading: &Heading<'_>) -> bool {
        heading.title_without_number().to_lowercase() == self.needle
    }
}

/// The ordered matcher list for a title hint.
///
/// Empty for a blank hint: a blank needle would match every heading.
pub fn matchers_for(hint: &str) -> Vec<Box<dyn TitleMatcher>> {
    if hint.trim().is_empty() {
        return Vec::new();
    }

    let mut matchers: Vec<Box<dyn TitleMatcher>> =
        vec![Box::new(ExactTitle::new(hint)), Box::new(ContainsTitle::new(hint))];
    if let Some(numberless) = NumberlessTitle::new(hint) {
        matchers.push(Box::new(numberless));
    }
    matchers
}

/// Find the first heading, in document order, accepted by any matcher.
///
/// Returns the heading and the name of the strategy that accepted it.
pub fn find_first<'a, I>(headings: I, matchers: &[Box<dyn TitleMatcher>]) -> Option<(Heading<'a>, &'static str)>
where
    I: IntoIterator<Item = Heading<'a>>,
{
    headings.into_iter().find_map(|heading| {
        matchers
            .iter()
            .find(|m| m.try_match(&heading))
            .map(|m| (heading, m.name()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(line: &str) -> Heading<'_> {
        Heading::parse(line, 0).expect("heading")
    }

    #[test]
    fn exact_is_case_insensitive() {
        let m = ExactTitle::new("1 introduction");
        assert!(m.try_match(&h("# 1 Introduction")));
        assert!(!m.try_match(&h("# 1 Introduction and Motivation")));
    }

    #[test]
    fn contains_matches_anywhere() {
        let m = ContainsTitle::new("Method");
        assert!(m.try_match(&h("## 3 Proposed METHODs")));
        assert!(!m.try_match(&h("## 3 Approach")));
    }

    #[test]
    fn numberless_requires_numbered_hint() {
        assert!(NumberlessTitle::new("Introduction").is_none());
        assert!(NumberlessTitle::new("1 ").is_none());
        let m = NumberlessTitle::new("1 Introduction").unwrap();
        assert!(m.try_match(&h("# 2 Introduction")));
        assert!(m.try_match(&h("# Introduction")));
        assert!(!m.try_match(&h("# 2 Introductions")));
    }

    #[test]
    fn matcher_order() {
        let names: Vec<_> = matchers_for("4 Experiments").iter().map(|m| m.name()).collect();
        assert_eq!(names, ["exact", "substring", "numberless"]);
        let names: Vec<_> = matchers_for("Experiments").iter().map(|m| m.name()).collect();
        assert_eq!(names, ["exact", "substring"]);
        assert!(matchers_for("   ").is_empty());
    }

    #[test]
    fn first_document_order_heading_wins() {
        let lines = ["# 5 Results A", "# 6 Results B"];
        let headings = lines.iter().enumerate().filter_map(|(i, l)| Heading::parse(l, i));
        let (found, how) = find_first(headings, &matchers_for("Results")).unwrap();
        assert_eq!(found.line_index, 0);
        assert_eq!(how, "substring");
    }
}

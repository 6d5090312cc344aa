//! Label → title mapping produced by the section classifier.
//!
//! The classifier answers with one `Label: Title` line per category:
//!
//! ```text
//! Introduction: 1 Introduction
//! Methods: 3 Proposed Approach
//! Experiments: 4 Evaluation
//! Conclusion: 6 Conclusion and Future Work
//! ```
//!
//! Lines without a colon are ignored. The split happens on the first colon
//! only, so titles may contain colons themselves. A repeated label replaces
//! the earlier title but keeps its original position.

use serde::Serialize;

/// Ordered label → title mapping with unique labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelMap {
    entries: Vec<(String, String)>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse classifier output.
    pub fn parse(text: &str) -> Self {
        text.lines().filter_map(parse_line).collect()
    }

    /// Insert or overwrite `label`.
    pub fn insert(&mut self, label: impl Into<String>, title: impl Into<String>) {
        let label = label.into();
        let title = title.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = title,
            None => self.entries.push((label, title)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, t)| t.as_str())
    }

    /// `(label, title)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), t.as_str()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<L: Into<String>, T: Into<String>> FromIterator<(L, T)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (L, T)>>(iter: I) -> Self {
        let mut map = LabelMap::new();
        for (label, title) in iter {
            map.insert(label, title);
        }
        map
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let (label, title) = line.trim().split_once(':')?;
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    Some((label.to_string(), title.trim().to_string()))
}

/// Parse classifier output into a [`LabelMap`].
pub fn parse_label_map(text: &str) -> LabelMap {
    LabelMap::parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_classifier_reply() {
        let map = parse_label_map(
            "Here are the sections:\n\
             Introduction: 1 Introduction\n\
             \n\
             Methods: 3 Method: A New Approach\n\
             no colon here\n\
             Conclusion:   5 Conclusion  \n",
        );
        // "Here are the sections:" has an empty title but a label.
        let labels: Vec<_> = map.labels().collect();
        assert_eq!(
            labels,
            ["Here are the sections", "Introduction", "Methods", "Conclusion"]
        );
        assert_eq!(map.get("Methods"), Some("3 Method: A New Approach"));
        assert_eq!(map.get("Conclusion"), Some("5 Conclusion"));
        assert_eq!(map.get("Here are the sections"), Some(""));
    }

    #[test]
    fn last_occurrence_wins_in_first_position() {
        let map = parse_label_map("A: one\nB: two\nA: three");
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, [("A", "three"), ("B", "two")]);
    }

    #[test]
    fn empty_label_is_ignored() {
        let map = parse_label_map(": orphan\n  :\nX: y");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("X"), Some("y"));
    }

    #[test]
    fn empty_input() {
        assert!(parse_label_map("").is_empty());
        assert!(parse_label_map("no colons\nat all").is_empty());
    }
}

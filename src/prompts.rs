//! Prompts sent to the model.
//!
//! The classification prompt asks the model to name, for each canonical
//! part of a paper, the heading title that starts it. The answer is parsed by
//! [`crate::section::parse_label_map`], so the prompt pins the reply to one
//! `Label: <title>` line per part.
//!
//! Callers can override the default via
//! [`crate::config::SliceConfig::classify_prompt`].

/// Canonical labels requested by [`DEFAULT_CLASSIFY_PROMPT`], in reply order.
pub const DEFAULT_LABELS: [&str; 4] = ["Introduction", "Methods", "Experiments", "Conclusion"];

/// Default prompt for mapping canonical labels onto a paper's headings.
pub const DEFAULT_CLASSIFY_PROMPT: &str = r#"You are reading the Markdown of an academic paper. Identify the heading that begins each of the following parts:

- Introduction: the motivation and problem statement
- Methods: the proposed approach, model, or algorithm
- Experiments: the experimental setup, evaluation, and results
- Conclusion: the concluding discussion

Reply with exactly one line per part, in this format and nothing else:

Introduction: <heading title>
Methods: <heading title>
Experiments: <heading title>
Conclusion: <heading title>

Copy each heading title exactly as it appears in the document, without the leading # characters. If a part has no matching heading, leave its title empty."#;

/// Separator between the prompt and the document body.
const DOCUMENT_SEPARATOR: &str = "\n\n\n";

/// Build the classification request text: prompt, separator, document.
pub fn classification_request(prompt: &str, document: &str) -> String {
    let mut text = String::with_capacity(prompt.len() + DOCUMENT_SEPARATOR.len() + document.len());
    text.push_str(prompt);
    text.push_str(DOCUMENT_SEPARATOR);
    text.push_str(document);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::parse_label_map;

    #[test]
    fn prompt_names_every_label() {
        for label in DEFAULT_LABELS {
            assert!(DEFAULT_CLASSIFY_PROMPT.contains(&format!("{label}: <heading title>")));
        }
    }

    #[test]
    fn request_layout() {
        let text = classification_request("P", "# Doc");
        assert_eq!(text, "P\n\n\n# Doc");
    }

    #[test]
    fn model_reply_in_requested_format_parses() {
        let reply = "Introduction: 1 Introduction\nMethods: 2 Method\nExperiments: 3 Results\nConclusion: 5 Conclusion";
        let map = parse_label_map(reply);
        assert_eq!(map.labels().collect::<Vec<_>>(), DEFAULT_LABELS);
        assert_eq!(map.get("Methods"), Some("2 Method"));
    }
}

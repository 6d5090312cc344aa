//! Section extraction for heading-structured Markdown.
//!
//! Given a document and the classifier's label → title mapping, locate the
//! heading each title names and cut out exactly that heading's subtree.
//!
//! ```text
//! classifier reply ──▶ labels ──▶ matcher ──▶ extract ──▶ ExtractedSection
//!                      (parse)    (which       (where does
//!                                  heading?)    it end?)
//! ```
//!
//! 1. [`labels`]:  parse `Label: Title` lines into an ordered [`LabelMap`]
//! 2. [`heading`]: recognise `#` headings and their dotted section numbers
//! 3. [`matcher`]: the three title-matching strategies, tried in order
//! 4. [`extract`]: the forward boundary scan
//! 5. [`pages`]:   the unrelated, simpler cut on `# 页 N` page markers
//!
//! Everything here is pure: no I/O, no shared state.

pub mod extract;
pub mod heading;
pub mod labels;
pub mod matcher;
pub mod pages;

pub use extract::{extract, extract_all, find_heading, section_end, Document, ExtractedSection};
pub use heading::Heading;
pub use labels::{parse_label_map, LabelMap};
pub use matcher::TitleMatcher;
pub use pages::{split_pages, Page, PageSplitter, DEFAULT_PAGE_MARKER};

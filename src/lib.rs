//! # mdslice
//!
//! Slice heading-structured Markdown into labelled sections, and talk to an
//! OpenAI-compatible model with inline images and bounded retries.
//!
//! Papers converted to Markdown keep their heading hierarchy but lose any
//! notion of which heading starts the methods or the experiments. This
//! crate asks a model to map canonical labels onto the paper's own headings,
//! then cuts each labelled heading's subtree out of the document and writes
//! it to its own file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Input     read the document (input)
//!  ├─ 2. Classify  model maps Introduction/Methods/… to headings (client, prompts)
//!  ├─ 3. Match     exact → substring → numberless title matching (section)
//!  ├─ 4. Bound     heading depth + dotted-decimal descendant scan (section)
//!  └─ 5. Output    one `{stem}_{label}.md` per section (slice)
//! ```
//!
//! The extractor (step 3 and 4) is pure and works without any network
//! access; see [`section::extract`]. The request client is usable on its own
//! for any prompt with `![](path)` image references; see
//! [`client::RequestClient`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdslice::{slice_file, ClientConfig, RequestClient, SliceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RequestClient::new(ClientConfig::from_file("config.json")?.build()?)?;
//!     let config = SliceConfig::builder().output_dir("sections").build()?;
//!     let report = slice_file("paper.md", &client, &config).await?;
//!     for file in &report.files {
//!         println!("{} → {}", file.label, file.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Offline extraction with a known heading:
//!
//! ```rust
//! use mdslice::section::{extract, Document};
//!
//! let doc = Document::new("# 2 Method\ntext\n# 2.1 Setup\nmore\n# 3 Results\nnums");
//! let section = extract(&doc, "Methods", "Method").unwrap();
//! assert_eq!(section.content, "# 2 Method\ntext\n# 2.1 Setup\nmore");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mdslice` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod progress;
pub mod prompts;
pub mod section;
pub mod slice;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{RequestClient, RequestPayload};
pub use config::{ClientConfig, ClientConfigBuilder, SliceConfig, SliceConfigBuilder};
pub use error::{ExtractError, MdSliceError, RequestFailure, TransportError};
pub use output::{
    BatchFailure, BatchSummary, SectionFile, SliceOutput, SliceReport, WriteFailure, WrittenFiles,
};
pub use progress::{NoopProgressCallback, ProgressCallback, SliceProgressCallback};
pub use section::{extract, ExtractedSection, LabelMap};
pub use slice::{
    classify_sections, slice_batch, slice_file, slice_file_sync, slice_file_with_labels,
    slice_text, write_pages, write_sections,
};

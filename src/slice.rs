//! Slicing entry points: classify a document's headings, extract each
//! labelled section, and write one file per section.
//!
//! ```text
//! read ──▶ classify (model) ──▶ LabelMap ──▶ extract_all ──▶ write files
//!                                   ▲
//!             caller-supplied ──────┘   (slice_file_with_labels)
//! ```
//!
//! A document that cannot be read, or whose classification request fails,
//! is an `Err`. A label whose heading cannot be found is not: it lands in
//! [`SliceOutput::missing`] and the remaining labels are still written.
//! A section file that cannot be written is not fatal either; it lands in
//! [`SliceReport::write_failures`].
//! [`slice_batch`] goes one step further and never fails as a whole; every
//! per-document error is collected into the [`BatchSummary`].

use crate::client::{RequestClient, RequestPayload};
use crate::config::SliceConfig;
use crate::error::MdSliceError;
use crate::input::{self, InputDocument};
use crate::output::{
    BatchFailure, BatchSummary, SectionFile, SliceOutput, SliceReport, WriteFailure, WrittenFiles,
};
use crate::progress::ProgressCallback;
use crate::prompts::{classification_request, DEFAULT_CLASSIFY_PROMPT};
use crate::section::{extract_all, parse_label_map, Document, LabelMap, Page, PageSplitter};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Ask the model which heading starts each canonical part of `document`.
///
/// The request is text-only: image references in the document are sent as
/// written, not inlined.
///
/// # Errors
/// [`MdSliceError::Classification`] when the request fails after retries,
/// [`MdSliceError::NoLabels`] when the reply contains no `Label: Title` line.
pub async fn classify_sections(
    client: &RequestClient,
    document: &InputDocument,
    config: &SliceConfig,
) -> Result<LabelMap, MdSliceError> {
    let prompt = config
        .classify_prompt
        .as_deref()
        .unwrap_or(DEFAULT_CLASSIFY_PROMPT);
    let payload = RequestPayload::text(classification_request(prompt, &document.text));

    let reply = client
        .send(&payload)
        .await
        .map_err(MdSliceError::Classification)?;
    debug!("Classifier reply for {}:\n{}", document.path.display(), reply);

    let labels = parse_label_map(&reply);
    if labels.is_empty() {
        return Err(MdSliceError::NoLabels {
            path: document.path.clone(),
        });
    }
    info!(
        "Classified {}: {}",
        document.path.display(),
        labels.labels().collect::<Vec<_>>().join(", ")
    );
    Ok(labels)
}

/// Extract every label of `labels` from `text`.
pub fn slice_text(text: &str, labels: &LabelMap) -> SliceOutput {
    let document = Document::new(text);
    let mut output = SliceOutput::default();
    for result in extract_all(&document, labels) {
        match result {
            Ok(section) => output.sections.push(section),
            Err(e) => output.missing.push(e),
        }
    }
    output
}

/// Write each extracted section to `{stem}_{label}.{ext}` under
/// `config.output_dir`, creating the directory if needed.
///
/// A file that cannot be written is recorded in [`WrittenFiles::failed`]
/// and the remaining sections are still written. Two labels that sanitise
/// to the same file name (`A/B` and `A_B`) are reported the same way: the
/// first label keeps the file, the second is not written.
///
/// # Errors
/// [`MdSliceError::OutputWriteFailed`] only when the output directory
/// cannot be created.
pub async fn write_sections(
    output: &SliceOutput,
    document_stem: &str,
    config: &SliceConfig,
) -> Result<WrittenFiles, MdSliceError> {
    ensure_dir(&config.output_dir).await?;

    let entries = output.sections.iter().map(|section| {
        (
            section.label.clone(),
            config.section_path(document_stem, &section.label),
            section.content.as_str(),
        )
    });
    let written = write_entries(entries).await;
    debug!(
        "Wrote {} section file(s) for '{}', {} failed",
        written.files.len(),
        document_stem,
        written.failed.len()
    );
    Ok(written)
}

/// Write each page to `{stem}_{word}{n}.{ext}` under `config.output_dir`,
/// where `word` is the splitter's marker word.
///
/// Per-page failures are collected the same way as in [`write_sections`].
pub async fn write_pages(
    pages: &[Page],
    document_stem: &str,
    splitter: &PageSplitter,
    config: &SliceConfig,
) -> Result<WrittenFiles, MdSliceError> {
    ensure_dir(&config.output_dir).await?;

    let word = splitter.file_word();
    let entries = pages.iter().map(|page| {
        let path = config.output_dir.join(format!(
            "{}_{}{}.{}",
            document_stem, word, page.number, config.file_extension
        ));
        (page.number.to_string(), path, page.content.as_str())
    });
    let written = write_entries(entries).await;
    info!(
        "Wrote {} page file(s) for '{}'",
        written.files.len(),
        document_stem
    );
    Ok(written)
}

/// Read, classify, extract and write one document.
pub async fn slice_file(
    path: impl AsRef<Path>,
    client: &RequestClient,
    config: &SliceConfig,
) -> Result<SliceReport, MdSliceError> {
    let start = Instant::now();
    let document = input::read_document(path).await?;
    info!("Slicing {}", document.path.display());

    let labels = classify_sections(client, &document, config).await?;
    finish(document, labels, config, start).await
}

/// Like [`slice_file`], with a caller-supplied label map instead of a
/// classification request.
pub async fn slice_file_with_labels(
    path: impl AsRef<Path>,
    labels: &LabelMap,
    config: &SliceConfig,
) -> Result<SliceReport, MdSliceError> {
    let start = Instant::now();
    let document = input::read_document(path).await?;
    info!("Slicing {} with {} given label(s)", document.path.display(), labels.len());
    finish(document, labels.clone(), config, start).await
}

/// Slice many documents one after another.
///
/// Never fails as a whole: each document's error is recorded in
/// [`BatchSummary::failures`] and the batch moves on.
pub async fn slice_batch<P: AsRef<Path>>(
    paths: &[P],
    client: &RequestClient,
    config: &SliceConfig,
    progress: Option<ProgressCallback>,
) -> BatchSummary {
    let total = paths.len();
    let mut summary = BatchSummary::default();
    if let Some(ref cb) = progress {
        cb.on_batch_start(total);
    }

    for (i, path) in paths.iter().enumerate() {
        let doc_num = i + 1;
        let path = path.as_ref();
        if let Some(ref cb) = progress {
            cb.on_document_start(doc_num, total);
        }

        match slice_file(path, client, config).await {
            Ok(report) => {
                if let Some(ref cb) = progress {
                    for file in &report.files {
                        cb.on_section_written(doc_num, &file.label, file.bytes);
                    }
                    for failure in &report.write_failures {
                        cb.on_section_failed(doc_num, &failure.label, &failure.error);
                    }
                    for missing in &report.missing {
                        let title = report.labels.get(missing.label()).unwrap_or_default();
                        cb.on_section_missing(doc_num, missing.label(), title);
                    }
                    cb.on_document_complete(doc_num, total, report.files.len());
                }
                summary.reports.push(report);
            }
            Err(e) => {
                warn!("Document {}/{} failed: {}", doc_num, total, e);
                if let Some(ref cb) = progress {
                    cb.on_document_error(doc_num, total, &e.to_string());
                }
                summary.failures.push(BatchFailure {
                    input: path.to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Batch complete: {}/{} documents, {} file(s), {} missing section(s), {} write failure(s)",
        summary.reports.len(),
        total,
        summary.files_written(),
        summary.missing_sections(),
        summary.write_failures()
    );
    if let Some(ref cb) = progress {
        cb.on_batch_complete(total, summary.reports.len());
    }
    summary
}

/// Synchronous wrapper around [`slice_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn slice_file_sync(
    path: impl AsRef<Path>,
    client: &RequestClient,
    config: &SliceConfig,
) -> Result<SliceReport, MdSliceError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MdSliceError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(slice_file(path, client, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn finish(
    document: InputDocument,
    labels: LabelMap,
    config: &SliceConfig,
    start: Instant,
) -> Result<SliceReport, MdSliceError> {
    let output = slice_text(&document.text, &labels);
    let written = write_sections(&output, &document.stem(), config).await?;

    let report = SliceReport {
        input: document.path,
        labels,
        files: written.files,
        missing: output.missing,
        write_failures: written.failed,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "{}: {} section(s) written, {} missing, {} failed, {}ms",
        report.input.display(),
        report.files.len(),
        report.missing.len(),
        report.write_failures.len(),
        report.duration_ms
    );
    Ok(report)
}

/// Write `(label, path, content)` entries in order, collecting failures.
async fn write_entries<'a>(
    entries: impl Iterator<Item = (String, PathBuf, &'a str)>,
) -> WrittenFiles {
    let mut written = WrittenFiles::default();
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();

    for (label, path, content) in entries {
        if let Some(owner) = claimed.get(&path) {
            warn!(
                "Label '{}' maps to {}, already written for '{}'; skipping",
                label,
                path.display(),
                owner
            );
            let error = format!("file name collides with label '{}'", owner);
            written.failed.push(WriteFailure { label, path, error });
            continue;
        }
        claimed.insert(path.clone(), label.clone());

        match write_atomic(&path, content).await {
            Ok(()) => {
                debug!("Wrote {} ({} bytes)", path.display(), content.len());
                written.files.push(SectionFile {
                    label,
                    path,
                    bytes: content.len(),
                });
            }
            Err(e) => {
                warn!("Could not write '{}': {}", label, e);
                written.failed.push(WriteFailure {
                    label,
                    path,
                    error: e.to_string(),
                });
            }
        }
    }
    written
}

async fn ensure_dir(dir: &Path) -> Result<(), MdSliceError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| MdSliceError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })
}

/// Write to a temp file next to `path`, then rename over it.
async fn write_atomic(path: &Path, content: &str) -> Result<(), MdSliceError> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, content)
        .await
        .map_err(|e| MdSliceError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(MdSliceError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

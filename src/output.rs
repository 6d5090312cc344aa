//! Result types returned by the slicing driver.

use crate::error::ExtractError;
use crate::section::{ExtractedSection, LabelMap};
use serde::Serialize;
use std::path::PathBuf;

/// Sections extracted from one document, plus the labels that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SliceOutput {
    /// Successfully extracted sections, in label-map order.
    pub sections: Vec<ExtractedSection>,
    /// Labels whose heading could not be located.
    pub missing: Vec<ExtractError>,
}

impl SliceOutput {
    /// `true` when every label produced a section.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn section(&self, label: &str) -> Option<&ExtractedSection> {
        self.sections.iter().find(|s| s.label == label)
    }
}

/// One file written by [`crate::slice::write_sections`] or
/// [`crate::slice::write_pages`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionFile {
    /// Section label, or the page number for page splits.
    pub label: String,
    pub path: PathBuf,
    pub bytes: usize,
}

/// A section or page file that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub label: String,
    pub path: PathBuf,
    pub error: String,
}

/// Files written for one document, and the ones that failed.
///
/// One failed file never stops the others from being written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WrittenFiles {
    pub files: Vec<SectionFile>,
    pub failed: Vec<WriteFailure>,
}

impl WrittenFiles {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of slicing one document end to end.
#[derive(Debug, Clone, Serialize)]
pub struct SliceReport {
    pub input: PathBuf,
    /// The label map used, from the classifier or the caller.
    pub labels: LabelMap,
    pub files: Vec<SectionFile>,
    pub missing: Vec<ExtractError>,
    /// Sections that were extracted but could not be written.
    pub write_failures: Vec<WriteFailure>,
    pub duration_ms: u64,
}

impl SliceReport {
    /// `true` when every label was found and written.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.write_failures.is_empty()
    }
}

/// A document of a batch that failed outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: String,
}

/// Accumulated results of [`crate::slice::slice_batch`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub reports: Vec<SliceReport>,
    pub failures: Vec<BatchFailure>,
}

impl BatchSummary {
    pub fn documents(&self) -> usize {
        self.reports.len() + self.failures.len()
    }

    pub fn files_written(&self) -> usize {
        self.reports.iter().map(|r| r.files.len()).sum()
    }

    pub fn missing_sections(&self) -> usize {
        self.reports.iter().map(|r| r.missing.len()).sum()
    }

    pub fn write_failures(&self) -> usize {
        self.reports.iter().map(|r| r.write_failures.len()).sum()
    }

    /// `true` when no document failed and every section was found and written.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.reports.iter().all(SliceReport::is_complete)
    }
}

//! Progress-callback trait for per-document slicing events.
//!
//! Pass an [`Arc<dyn SliceProgressCallback>`] to
//! [`crate::slice::slice_batch`] to receive events as each document is
//! classified, sliced, and written. The CLI drives its progress bar from
//! these events.
//!
//! # Example
//!
//! ```rust
//! use mdslice::SliceProgressCallback;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl SliceProgressCallback for CountingCallback {
//!     fn on_section_written(&self, _doc: usize, label: &str, bytes: usize) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{label}: {bytes} bytes");
//!     }
//! }
//!
//! let cb: Arc<dyn SliceProgressCallback> = Arc::new(CountingCallback {
//!     written: AtomicUsize::new(0),
//! });
//! cb.on_section_written(1, "Methods", 120);
//! ```

use std::sync::Arc;

/// Called by the slicing driver as it works through a batch.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Documents in a batch are numbered from 1.
pub trait SliceProgressCallback: Send + Sync {
    /// Called once before the first document.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before the classification request for a document is sent.
    fn on_document_start(&self, doc_num: usize, total_documents: usize) {
        let _ = (doc_num, total_documents);
    }

    /// Called after each section file is written.
    fn on_section_written(&self, doc_num: usize, label: &str, bytes: usize) {
        let _ = (doc_num, label, bytes);
    }

    /// Called when a labelled section could not be located.
    fn on_section_missing(&self, doc_num: usize, label: &str, title: &str) {
        let _ = (doc_num, label, title);
    }

    /// Called when a section was extracted but its file could not be written.
    fn on_section_failed(&self, doc_num: usize, label: &str, error: &str) {
        let _ = (doc_num, label, error);
    }

    /// Called when a document is finished.
    fn on_document_complete(&self, doc_num: usize, total_documents: usize, sections: usize) {
        let _ = (doc_num, total_documents, sections);
    }

    /// Called when a document fails outright (unreadable, classification
    /// failure, output directory unusable).
    fn on_document_error(&self, doc_num: usize, total_documents: usize, error: &str) {
        let _ = (doc_num, total_documents, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SliceProgressCallback for NoopProgressCallback {}

/// Shared callback handle.
pub type ProgressCallback = Arc<dyn SliceProgressCallback>;

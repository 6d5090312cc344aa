//! Error types for the mdslice library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`MdSliceError`]: **Fatal for one operation**: a document cannot be
//!   read, the configuration is invalid, the classifier never answered.
//!   Returned as `Err(MdSliceError)` from the `slice_*` entry points. A batch
//!   records it against the offending document and moves on.
//!
//! * [`ExtractError`]: **Non-fatal, per label**: one label's heading could
//!   not be located. Stored in [`crate::output::SliceOutput::missing`] so the
//!   other labels of the same document are still written.
//!
//! * [`RequestFailure`]: **Per request**: the outcome of a failed call
//!   through [`crate::client::RequestClient`], already classified as
//!   transient or terminal. Batch drivers that prefer plain text can turn it
//!   into a prefixed failure string with [`RequestFailure::to_failure_text`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Prefix carried by every failure string produced by
/// [`RequestFailure::to_failure_text`].
pub const FAILURE_PREFIX: &str = "[request failed] ";

/// Returns `true` when `text` was produced by [`RequestFailure::to_failure_text`].
pub fn is_failure_text(text: &str) -> bool {
    text.starts_with(FAILURE_PREFIX)
}

/// All fatal errors returned by the mdslice library.
#[derive(Debug, Error)]
pub enum MdSliceError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read as UTF-8 text.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Classification errors ─────────────────────────────────────────────
    /// The section classifier request failed after retries.
    #[error("Section classification failed: {0}")]
    Classification(#[source] RequestFailure),

    /// The classifier replied, but no `Label: Title` line could be parsed.
    #[error("No section labels found in classifier output for '{path}'")]
    NoLabels { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {detail}")]
    ConfigLoad { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single label of a document.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ExtractError {
    /// No heading matched the title by any matching strategy.
    #[error("Section '{label}': no heading matches '{title}'")]
    NotFound { label: String, title: String },

    /// The classifier supplied a blank title for the label.
    #[error("Section '{label}': title is empty")]
    EmptyTitle { label: String },
}

impl ExtractError {
    /// The label this error belongs to.
    pub fn label(&self) -> &str {
        match self {
            ExtractError::NotFound { label, .. } | ExtractError::EmptyTitle { label } => label,
        }
    }
}

/// A transport-level fault: the request never produced an HTTP status.
///
/// Every variant is transient; the request client retries all of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("TLS error: {0}")]
    Tls(String),

    /// Malformed transport state: broken body, redirect loop, bad request build.
    #[error("transport error: {0}")]
    Protocol(String),
}

/// A classified request failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
    /// Network or connection fault. Retryable.
    #[error("{0}")]
    Transport(TransportError),

    /// 5xx from the remote server. Retryable.
    #[error("server error (HTTP {status}): {body}")]
    ServerError { status: u16, body: String },

    /// 4xx from the remote server. Terminal.
    #[error("client error (HTTP {status}): {body}")]
    ClientError { status: u16, body: String },

    /// A 2xx response without the expected answer content. Terminal.
    #[error("response did not contain the expected answer content: {body}")]
    MalformedResponse { body: String },

    /// A status that is neither success nor a 4xx/5xx fault. Terminal.
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Every attempt failed with a transient error.
    #[error("giving up after {attempts} attempts; last error: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<RequestFailure>,
    },
}

impl RequestFailure {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RequestFailure::Transport(_) | RequestFailure::ServerError { .. }
        )
    }

    /// Render the failure as data for batch drivers, tagged with
    /// [`FAILURE_PREFIX`].
    pub fn to_failure_text(&self) -> String {
        format!("{FAILURE_PREFIX}{self}")
    }
}

impl From<TransportError> for RequestFailure {
    fn from(e: TransportError) -> Self {
        RequestFailure::Transport(e)
    }
}

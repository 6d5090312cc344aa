//! Request payload assembly: text with `![](path)` image references →
//! annotated text plus inlined image bytes.
//!
//! Every real reference is resolved to a file, read, and measured. The pixel
//! size is spliced into the text right after the reference so the model can
//! reason about layout, and the bytes travel alongside as a separate content
//! part. A reference that cannot be read is skipped with a warning; the rest
//! of the payload is still sent.
//!
//! References between quote or backtick characters are examples, not
//! images to send: `` `![](example.jpg)` `` stays literal text.

use super::encode::{encode_data_url, image_dimensions, mime_type_for};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

static RE_IMAGE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[\]\((.+?)\)").unwrap());

/// Characters that delimit literal spans.
const QUOTE_CHARS: [char; 2] = ['\'', '`'];

/// One `![](path)` occurrence in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageReference<'a> {
    /// The path exactly as written between the parentheses.
    pub path: &'a str,
    /// Byte offset of `!`.
    pub start: usize,
    /// Byte offset just past `)`.
    pub end: usize,
}

/// An image read from disk, ready to inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// The reference as written in the text.
    pub reference: String,
    /// Resolved file path.
    pub path: PathBuf,
    pub mime_type: &'static str,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// `(width, height)` when the header could be decoded.
    pub dimensions: Option<(u32, u32)>,
}

impl InlineImage {
    /// Base64 `data:` URL for the request body.
    pub fn data_url(&self) -> String {
        encode_data_url(self.mime_type, &self.bytes)
    }
}

/// A reference that was left out of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImage {
    pub reference: String,
    pub path: PathBuf,
    pub reason: String,
}

/// A text block plus the images it references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPayload {
    /// Text sent to the model, with size annotations spliced in.
    pub text: String,
    pub images: Vec<InlineImage>,
    /// References that could not be read.
    pub skipped: Vec<SkippedImage>,
}

impl RequestPayload {
    /// A text-only payload; image references are left untouched.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Resolve, read and annotate every image reference in `text`.
    ///
    /// Relative paths resolve against `base_dir`, or the working directory
    /// when `None`. Files are read with `tokio::fs`, one after another.
    pub async fn assemble(text: &str, base_dir: Option<&Path>) -> Self {
        let mut annotated = String::with_capacity(text.len());
        let mut images = Vec::new();
        let mut skipped = Vec::new();
        let mut copied = 0;

        for reference in find_image_references(text) {
            annotated.push_str(&text[copied..reference.end]);
            copied = reference.end;

            let path = resolve_image_path(reference.path, base_dir);
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Skipping image '{}' ({}): {}", reference.path, path.display(), e);
                    skipped.push(SkippedImage {
                        reference: reference.path.to_string(),
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let dimensions = match image_dimensions(&bytes) {
                Ok((w, h)) => {
                    annotated.push_str(&size_annotation(w, h));
                    Some((w, h))
                }
                Err(e) => {
                    warn!("Could not measure image '{}': {}", path.display(), e);
                    None
                }
            };

            debug!("Inlining image {} ({} bytes)", path.display(), bytes.len());
            images.push(InlineImage {
                reference: reference.path.to_string(),
                mime_type: mime_type_for(&path),
                path,
                bytes,
                dimensions,
            });
        }
        annotated.push_str(&text[copied..]);

        Self {
            text: annotated,
            images,
            skipped,
        }
    }
}

/// Human-readable size annotation spliced after a reference.
pub fn size_annotation(width: u32, height: u32) -> String {
    format!(" (size: {width}×{height})")
}

/// All `![](path)` references that are not inside a quoted or backticked span.
pub fn find_image_references(text: &str) -> Vec<ImageReference<'_>> {
    RE_IMAGE_REF
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let path = caps.get(1)?;
            if is_quoted(text, whole.start(), whole.end()) {
                debug!("Ignoring quoted image reference '{}'", whole.as_str());
                return None;
            }
            Some(ImageReference {
                path: path.as_str(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// The nearest quote/backtick before `start` and the nearest after `end`
/// both exist, so the span is bracketed.
fn is_quoted(text: &str, start: usize, end: usize) -> bool {
    text[..start].rfind(QUOTE_CHARS).is_some() && text[end..].find(QUOTE_CHARS).is_some()
}

/// Absolute paths pass through; relative ones join `base_dir` or the
/// working directory.
pub fn resolve_image_path(reference: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match base_dir {
        Some(base) => base.join(path),
        None => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

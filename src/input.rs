//! Input resolution: read a Markdown document from disk.
//!
//! Missing files and permission problems get dedicated errors so the CLI can
//! print an actionable message instead of a bare `io::Error`.

use crate::error::MdSliceError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A document read into memory.
#[derive(Debug, Clone)]
pub struct InputDocument {
    pub path: PathBuf,
    pub text: String,
}

impl InputDocument {
    /// File name without extension, used to name output files.
    pub fn stem(&self) -> String {
        document_stem(&self.path)
    }

    /// Directory the document lives in; relative image references resolve here.
    pub fn base_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

/// The file stem of `path`, or `"document"` when it has none.
pub fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

/// Read `path` as UTF-8 text.
pub async fn read_document(path: impl AsRef<Path>) -> Result<InputDocument, MdSliceError> {
    let path = path.as_ref().to_path_buf();

    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(MdSliceError::FileNotFound { path });
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(MdSliceError::PermissionDenied { path });
        }
        Err(source) => return Err(MdSliceError::ReadFailed { path, source }),
    };

    debug!("Read {} ({} bytes)", path.display(), text.len());
    Ok(InputDocument { path, text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems() {
        assert_eq!(document_stem(Path::new("/a/paper.md")), "paper");
        assert_eq!(document_stem(Path::new("notes")), "notes");
        assert_eq!(document_stem(Path::new("/")), "document");
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.md");
        std::fs::write(&path, "# 1 Intro\ntext").unwrap();

        let doc = read_document(&path).await.unwrap();
        assert_eq!(doc.text, "# 1 Intro\ntext");
        assert_eq!(doc.stem(), "paper");
        assert_eq!(doc.base_dir(), Some(dir.path()));
    }

    #[tokio::test]
    async fn missing_file() {
        let err = read_document("/nonexistent/paper.md").await.unwrap_err();
        assert!(matches!(err, MdSliceError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn invalid_utf8_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = read_document(&path).await.unwrap_err();
        assert!(matches!(err, MdSliceError::ReadFailed { .. }));
    }

    #[test]
    fn relative_path_without_parent_has_no_base_dir() {
        let doc = InputDocument {
            path: PathBuf::from("paper.md"),
            text: String::new(),
        };
        assert_eq!(doc.base_dir(), None);
    }
}

//! Document output — where a finished document's text ends up.
//!
//! Every stored document gets its own locator: files are named with a UTC timestamp
//! plus a random UUID and opened with `create_new`, so no call can overwrite another.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::generation::document::DocumentKind;

pub const TEX_EXTENSION: &str = "tex";
pub const TEX_CONTENT_TYPE: &str = "application/x-tex";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSink {
    /// Write one `.tex` file per document into this directory.
    Directory(PathBuf),
    /// Return the document as a self-contained `data:` URL; nothing touches disk.
    DataUrl,
}

impl DocumentSink {
    /// Stores `full_text` and returns its locator (file path or data URL).
    pub async fn store(&self, kind: DocumentKind, full_text: &str) -> std::io::Result<String> {
        match self {
            DocumentSink::Directory(dir) => {
                let path = write_unique(dir, kind, full_text).await?;
                debug!("Wrote {} to {}", kind, path.display());
                Ok(path.display().to_string())
            }
            DocumentSink::DataUrl => Ok(encode_data_url(full_text)),
        }
    }
}

async fn write_unique(dir: &Path, kind: DocumentKind, full_text: &str) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(unique_file_name(kind));
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await?;
    file.write_all(full_text.as_bytes()).await?;
    file.flush().await?;
    Ok(path)
}

/// `<kind>-<utc timestamp>-<uuid>.tex`
pub fn unique_file_name(kind: DocumentKind) -> String {
    format!(
        "{}-{}-{}.{}",
        kind.file_stem(),
        Utc::now().format("%Y%m%dT%H%M%S"),
        Uuid::new_v4().simple(),
        TEX_EXTENSION
    )
}

pub fn encode_data_url(text: &str) -> String {
    format!("data:{};base64,{}", TEX_CONTENT_TYPE, STANDARD.encode(text))
}

/// True for bare `.tex` file names with no path components.
pub fn is_document_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".tex") else {
        return false;
    };
    !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_directory_sink_writes_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DocumentSink::Directory(dir.path().join("out"));

        let first = sink.store(DocumentKind::Resume, "same text").await.unwrap();
        let second = sink.store(DocumentKind::Resume, "same text").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "same text");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "same text");
    }

    #[tokio::test]
    async fn test_data_url_sink_round_trips_text() {
        let url = DocumentSink::DataUrl
            .store(DocumentKind::CoverLetter, "\\begin{document}")
            .await
            .unwrap();

        let encoded = url
            .strip_prefix("data:application/x-tex;base64,")
            .expect("data url prefix");
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, b"\\begin{document}");
    }

    #[test]
    fn test_unique_file_name_shape() {
        let name = unique_file_name(DocumentKind::CoverLetter);
        assert!(name.starts_with("cover_letter-"));
        assert!(name.ends_with(".tex"));
        assert!(is_document_name(&name));
    }

    #[test]
    fn test_is_document_name_rejects_traversal() {
        assert!(is_document_name("resume-20240101T000000-abc.tex"));
        assert!(!is_document_name("../secrets.tex"));
        assert!(!is_document_name("resume.pdf"));
        assert!(!is_document_name(".tex"));
        assert!(!is_document_name("a/b.tex"));
    }
}

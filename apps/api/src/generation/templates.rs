//! Template Store — the static preamble/postamble fragments wrapped around generated bodies.
//!
//! Fragments are loaded once at startup and never parsed or validated; they are
//! assumed to be well-formed LaTeX.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::generation::document::DocumentKind;

/// Where the four fragments live on disk.
#[derive(Debug, Clone)]
pub struct TemplatePaths {
    pub resume_prefix: PathBuf,
    pub resume_suffix: PathBuf,
    pub cover_letter_prefix: PathBuf,
    pub cover_letter_suffix: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplatePair {
    pub prefix: String,
    pub suffix: String,
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    resume: TemplatePair,
    cover_letter: TemplatePair,
}

impl TemplateStore {
    /// Reads all four fragments. Fails naming the first path that cannot be read.
    pub async fn load(paths: &TemplatePaths) -> Result<Self> {
        let resume = TemplatePair {
            prefix: read_fragment(&paths.resume_prefix).await?,
            suffix: read_fragment(&paths.resume_suffix).await?,
        };
        let cover_letter = TemplatePair {
            prefix: read_fragment(&paths.cover_letter_prefix).await?,
            suffix: read_fragment(&paths.cover_letter_suffix).await?,
        };
        info!("Loaded resume and cover letter templates");
        Ok(Self::from_pairs(resume, cover_letter))
    }

    pub fn from_pairs(resume: TemplatePair, cover_letter: TemplatePair) -> Self {
        Self {
            resume,
            cover_letter,
        }
    }

    pub fn pair(&self, kind: DocumentKind) -> &TemplatePair {
        match kind {
            DocumentKind::Resume => &self.resume,
            DocumentKind::CoverLetter => &self.cover_letter,
        }
    }
}

async fn read_fragment(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Template fragment '{}' could not be read", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_reads_all_fragments() {
        let dir = tempfile::tempdir().unwrap();
        let paths = TemplatePaths {
            resume_prefix: write(dir.path(), "rp.tex", "\\documentclass{article}"),
            resume_suffix: write(dir.path(), "rs.tex", "\\end{document}"),
            cover_letter_prefix: write(dir.path(), "cp.tex", "\\documentclass{letter}"),
            cover_letter_suffix: write(dir.path(), "cs.tex", ""),
        };

        let store = TemplateStore::load(&paths).await.unwrap();

        assert_eq!(store.pair(DocumentKind::Resume).prefix, "\\documentclass{article}");
        assert_eq!(store.pair(DocumentKind::Resume).suffix, "\\end{document}");
        assert_eq!(store.pair(DocumentKind::CoverLetter).prefix, "\\documentclass{letter}");
        assert_eq!(store.pair(DocumentKind::CoverLetter).suffix, "");
    }

    #[tokio::test]
    async fn test_load_names_missing_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.tex");
        let paths = TemplatePaths {
            resume_prefix: write(dir.path(), "rp.tex", "a"),
            resume_suffix: missing.clone(),
            cover_letter_prefix: write(dir.path(), "cp.tex", "b"),
            cover_letter_suffix: write(dir.path(), "cs.tex", "c"),
        };

        let err = TemplateStore::load(&paths).await.unwrap_err();
        assert!(err.to_string().contains("nope.tex"));
    }
}

//! LaTeX rendering — compiles a generated `.tex` document to PDF with `pdflatex`.
//!
//! Each compile runs in its own temporary directory, removed when the call returns.

use std::process::Stdio;

use anyhow::Context;
use bytes::Bytes;
use tokio::process::Command;
use tracing::{info, warn};

use crate::errors::AppError;

const JOB_NAME: &str = "document";
/// Lines of pdflatex output returned to the caller when compilation fails.
const LOG_TAIL_LINES: usize = 20;

pub async fn compile_pdf(tex: &str, pdflatex_bin: &str) -> Result<Bytes, AppError> {
    let workdir = tempfile::tempdir().context("Failed to create LaTeX work directory")?;
    let source = workdir.path().join(format!("{JOB_NAME}.tex"));
    tokio::fs::write(&source, tex)
        .await
        .context("Failed to write LaTeX source")?;

    let output = Command::new(pdflatex_bin)
        .arg("-interaction=nonstopmode")
        .arg("-halt-on-error")
        .arg("-output-directory")
        .arg(workdir.path())
        .arg(&source)
        .current_dir(workdir.path())
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to run '{pdflatex_bin}'"))?;

    if !output.status.success() {
        let log = String::from_utf8_lossy(&output.stdout);
        warn!("pdflatex exited with {}", output.status);
        return Err(AppError::UnprocessableEntity(format!(
            "LaTeX compilation failed:\n{}",
            log_tail(&log, LOG_TAIL_LINES)
        )));
    }

    let pdf = tokio::fs::read(workdir.path().join(format!("{JOB_NAME}.pdf")))
        .await
        .context("pdflatex reported success but produced no PDF")?;
    info!("Compiled PDF ({} bytes)", pdf.len());
    Ok(Bytes::from(pdf))
}

/// Last `lines` non-empty lines of a pdflatex log.
fn log_tail(log: &str, lines: usize) -> String {
    let kept: Vec<&str> = log.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = kept.len().saturating_sub(lines);
    kept[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_tail_keeps_last_non_empty_lines() {
        let log = "a\n\nb\nc\n\n! Undefined control sequence.\n";
        assert_eq!(log_tail(log, 2), "c\n! Undefined control sequence.");
        assert_eq!(log_tail("x", 5), "x");
    }

    #[tokio::test]
    async fn test_missing_binary_is_internal_error() {
        let result = compile_pdf("\\end{document}", "tailor-no-such-pdflatex-binary").await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_failing_compiler_returns_log_tail() {
        // `false` ignores its arguments and exits non-zero.
        let result = compile_pdf("\\begin{document}", "false").await;
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
    }
}

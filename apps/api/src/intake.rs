//! Résumé intake — turns an uploaded file into plain text.
//!
//! PDF goes through `pdf-extract`; plain text is taken as UTF-8. Anything else is rejected.

use tracing::{info, warn};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    PlainText,
}

impl ResumeFormat {
    /// Decides the format from the content type, falling back to the file extension.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Result<Self, AppError> {
        match content_type {
            Some("application/pdf") => return Ok(ResumeFormat::Pdf),
            Some(ct) if ct.starts_with("text/plain") => return Ok(ResumeFormat::PlainText),
            _ => {}
        }

        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => Ok(ResumeFormat::Pdf),
            Some("txt") => Ok(ResumeFormat::PlainText),
            _ => Err(AppError::Validation(
                "Unsupported resume format; upload a PDF or .txt file".to_string(),
            )),
        }
    }
}

/// Extracts trimmed text. CPU-bound for PDFs; call from `spawn_blocking`.
pub fn extract_resume_text(format: ResumeFormat, bytes: &[u8]) -> Result<String, AppError> {
    let text = match format {
        ResumeFormat::Pdf => pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            warn!("PDF text extraction failed: {e}");
            AppError::Validation("Could not read text from the uploaded PDF".to_string())
        })?,
        ResumeFormat::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::Validation("Resume text is not valid UTF-8".to_string()))?,
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "No text could be extracted from the uploaded resume".to_string(),
        ));
    }

    info!("Extracted {} characters of resume text", text.len());
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_prefers_content_type() {
        assert_eq!(
            ResumeFormat::detect(Some("resume.txt"), Some("application/pdf")).unwrap(),
            ResumeFormat::Pdf
        );
        assert_eq!(
            ResumeFormat::detect(None, Some("text/plain; charset=utf-8")).unwrap(),
            ResumeFormat::PlainText
        );
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        assert_eq!(
            ResumeFormat::detect(Some("Resume.PDF"), Some("application/octet-stream")).unwrap(),
            ResumeFormat::Pdf
        );
        assert!(ResumeFormat::detect(Some("resume.docx"), None).is_err());
        assert!(ResumeFormat::detect(None, None).is_err());
    }

    #[test]
    fn test_plain_text_is_trimmed() {
        let text = extract_resume_text(ResumeFormat::PlainText, b"\n  Ada Lovelace\nRust  \n").unwrap();
        assert_eq!(text, "Ada Lovelace\nRust");
    }

    #[test]
    fn test_blank_text_is_rejected() {
        let result = extract_resume_text(ResumeFormat::PlainText, b"   \n\t");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let result = extract_resume_text(ResumeFormat::PlainText, &[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_garbage_pdf_is_rejected() {
        let result = extract_resume_text(ResumeFormat::Pdf, b"definitely not a pdf");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

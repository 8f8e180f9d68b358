//! Generation data model — request, finished document, failure report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::prompts::{
    cover_letter_instructions, resume_instructions, COVER_LETTER_ASSISTANT_NAME,
    RESUME_ASSISTANT_NAME,
};
use crate::generation::templates::TemplatePair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    CoverLetter,
}

impl DocumentKind {
    /// Generation order for a single job posting.
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Resume, DocumentKind::CoverLetter];

    pub fn file_stem(self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::CoverLetter => "cover_letter",
        }
    }

    pub fn assistant_name(self) -> &'static str {
        match self {
            DocumentKind::Resume => RESUME_ASSISTANT_NAME,
            DocumentKind::CoverLetter => COVER_LETTER_ASSISTANT_NAME,
        }
    }

    pub fn instructions(self) -> String {
        match self {
            DocumentKind::Resume => resume_instructions(),
            DocumentKind::CoverLetter => cover_letter_instructions(),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Everything one `generate` call needs. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    kind: DocumentKind,
    candidate_profile_text: String,
    target_description_text: String,
    template_prefix: String,
    template_suffix: String,
    assistant_profile_id: String,
}

impl GenerationRequest {
    /// Rejects empty resume or job description text up front.
    pub fn new(
        kind: DocumentKind,
        candidate_profile_text: impl Into<String>,
        target_description_text: impl Into<String>,
        templates: &TemplatePair,
        assistant_profile_id: impl Into<String>,
    ) -> Result<Self, AppError> {
        let candidate_profile_text = candidate_profile_text.into();
        let target_description_text = target_description_text.into();

        if candidate_profile_text.trim().is_empty() {
            return Err(AppError::Validation(
                "Resume text cannot be empty".to_string(),
            ));
        }
        if target_description_text.trim().is_empty() {
            return Err(AppError::Validation(
                "Job description cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            kind,
            candidate_profile_text,
            target_description_text,
            template_prefix: templates.prefix.clone(),
            template_suffix: templates.suffix.clone(),
            assistant_profile_id: assistant_profile_id.into(),
        })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn candidate_profile_text(&self) -> &str {
        &self.candidate_profile_text
    }

    pub fn target_description_text(&self) -> &str {
        &self.target_description_text
    }

    pub fn template_prefix(&self) -> &str {
        &self.template_prefix
    }

    pub fn template_suffix(&self) -> &str {
        &self.template_suffix
    }

    pub fn assistant_profile_id(&self) -> &str {
        &self.assistant_profile_id
    }
}

/// A finished document. Only ever built from a completed run with non-empty body text.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub kind: DocumentKind,
    pub body_text: String,
    pub full_text: String,
    /// File path or `data:` URL, depending on the configured sink.
    pub storage_locator: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The run completed but the assistant produced no usable text.
    EmptyGeneration,
    /// The run ended in a terminal status other than completed.
    RunDidNotComplete,
    /// A remote call failed (network, authorization, rate limit, bad payload).
    TransportError,
    /// The run was still pending when the poll deadline passed.
    TimedOut,
    /// The document was generated but could not be written out.
    StorageError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureReason::EmptyGeneration => "empty generation",
            FailureReason::RunDidNotComplete => "run did not complete",
            FailureReason::TransportError => "transport error",
            FailureReason::TimedOut => "timed out",
            FailureReason::StorageError => "storage error",
        };
        f.write_str(label)
    }
}

/// Structured failure returned by the engine in place of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub reason: FailureReason,
    pub detail: Option<String>,
}

impl FailureReport {
    pub fn new(reason: FailureReason, detail: Option<String>) -> Self {
        Self { reason, detail }
    }

    pub fn transport(error: impl fmt::Display) -> Self {
        Self::new(FailureReason::TransportError, Some(error.to_string()))
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.reason, detail),
            None => write!(f, "{}", self.reason),
        }
    }
}

//! Axum route handlers for document generation and download.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::document::{
    DocumentKind, FailureReport, GeneratedDocument, GenerationRequest,
};
use crate::generation::output::{is_document_name, TEX_CONTENT_TYPE};
use crate::render::compile_pdf;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DocumentFailure {
    pub kind: DocumentKind,
    #[serde(flatten)]
    pub report: FailureReport,
}

#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub kind: DocumentKind,
    pub body_text: String,
    /// Omitted when the locator is a data URL, which already carries the full text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    pub storage_locator: String,
    /// Set when the document was written to the output directory.
    pub download_url: Option<String>,
}

impl From<GeneratedDocument> for DocumentView {
    fn from(document: GeneratedDocument) -> Self {
        let download_url = std::path::Path::new(&document.storage_locator)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| is_document_name(name))
            .map(|name| format!("/api/v1/documents/{name}"));
        let full_text = (!document.storage_locator.starts_with("data:"))
            .then_some(document.full_text);
        Self {
            kind: document.kind,
            body_text: document.body_text,
            full_text,
            storage_locator: document.storage_locator,
            download_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateDocumentsResponse {
    pub job_title: String,
    pub documents: Vec<DocumentView>,
    pub failures: Vec<DocumentFailure>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:sid/jobs/:index/documents
///
/// Generates the résumé and then the cover letter for one listing, one run at a time.
/// The session stays locked for the whole exchange. A failed kind, including a failed
/// assistant registration, does not stop the other; any failure turns the response
/// into a 422 carrying the reports.
pub async fn handle_generate_documents(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(Uuid, usize)>,
) -> Result<(StatusCode, Json<GenerateDocumentsResponse>), AppError> {
    let handle = state.sessions.get(session_id).await?;
    let mut session = handle.lock().await;

    let credential = session.credential()?.clone();
    let resume_text = session.resume_text()?.to_string();
    let posting = session
        .listings
        .get(index)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("No job listing at index {index}")))?;

    let mut documents = Vec::new();
    let mut failures = Vec::new();

    for kind in DocumentKind::ALL {
        let profile = match session
            .assistants
            .get_or_register(state.assistants.as_ref(), &credential, kind)
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Could not register {} assistant: {}", kind, e);
                failures.push(DocumentFailure {
                    kind,
                    report: FailureReport::transport(format!("assistant registration failed: {e}")),
                });
                continue;
            }
        };

        let request = GenerationRequest::new(
            kind,
            resume_text.as_str(),
            posting.description.as_str(),
            state.templates.pair(kind),
            profile.id,
        )?;

        match state.engine.generate(&request, &credential).await {
            Ok(document) => documents.push(DocumentView::from(document)),
            Err(report) => failures.push(DocumentFailure { kind, report }),
        }
    }

    let status = if failures.is_empty() {
        info!("Generated {} documents for '{}'", documents.len(), posting.title);
        StatusCode::OK
    } else {
        warn!(
            "{} of {} documents failed for '{}'",
            failures.len(),
            DocumentKind::ALL.len(),
            posting.title
        );
        StatusCode::UNPROCESSABLE_ENTITY
    };

    Ok((
        status,
        Json(GenerateDocumentsResponse {
            job_title: posting.title,
            documents,
            failures,
        }),
    ))
}

/// GET /api/v1/documents/:name
pub async fn handle_download_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tex = read_document(&state, &name).await?;
    Ok((
        [
            (header::CONTENT_TYPE, TEX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\"")),
        ],
        tex,
    ))
}

/// GET /api/v1/documents/:name/pdf
///
/// Compiles the stored `.tex` document on demand.
pub async fn handle_download_pdf(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tex = read_document(&state, &name).await?;
    let pdf = compile_pdf(&tex, &state.config.pdflatex_bin).await?;

    let pdf_name = match name.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.pdf"),
        None => format!("{name}.pdf"),
    };
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{pdf_name}\"")),
        ],
        pdf,
    ))
}

async fn read_document(state: &AppState, name: &str) -> Result<String, AppError> {
    if !is_document_name(name) {
        return Err(AppError::Validation(format!("'{name}' is not a document name")));
    }
    let path = state.config.output_dir.join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(tex) => Ok(tex),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound(format!("Document {name} not found")))
        }
        Err(e) => Err(AppError::Storage(format!("Failed to read {}: {e}", path.display()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(storage_locator: &str) -> GeneratedDocument {
        GeneratedDocument {
            kind: DocumentKind::Resume,
            body_text: "BODY".to_string(),
            full_text: "PREFIX\nBODY\nSUFFIX".to_string(),
            storage_locator: storage_locator.to_string(),
        }
    }

    #[test]
    fn test_data_url_view_omits_full_text() {
        let view = DocumentView::from(document("data:application/x-tex;base64,UFJFRklY"));
        assert!(view.full_text.is_none());
        assert!(view.download_url.is_none());

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("full_text").is_none());
        assert_eq!(json["body_text"], "BODY");
    }

    #[test]
    fn test_file_view_links_download() {
        let view = DocumentView::from(document("/srv/generated/resume-20260101T000000-abc123.tex"));
        assert_eq!(view.full_text.as_deref(), Some("PREFIX\nBODY\nSUFFIX"));
        assert_eq!(
            view.download_url.as_deref(),
            Some("/api/v1/documents/resume-20260101T000000-abc123.tex")
        );
    }
}

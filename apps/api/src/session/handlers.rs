//! Axum route handlers for sign-in, API key, résumé upload and preferences.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::{extract_resume_text, ResumeFormat};
use crate::llm_client::Credential;
use crate::profiles::{JobPreferences, UserProfile};
use crate::session::SessionSummary;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ApiKeyRequest {
    pub api_key: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Signs in by email, creating the profile on first use, and opens a session.
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<(StatusCode, Json<SessionSummary>), AppError> {
    let user = state.profiles.find_or_create(&request.email).await?;
    let handle = state.sessions.create(user).await;
    let session = handle.lock().await;
    info!(
        "Opened session {} for user {} ({} active)",
        session.id,
        session.user.id,
        state.sessions.len().await
    );
    Ok((StatusCode::CREATED, Json(session.summary())))
}

/// GET /api/v1/sessions/:sid
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let handle = state.sessions.get(session_id).await?;
    let session = handle.lock().await;
    Ok(Json(session.summary()))
}

/// GET /api/v1/sessions/:sid/profile
///
/// The stored profile (email, résumé text, preferences) for form autofill.
/// Read from the profile store so it reflects what was actually saved.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<UserProfile>, AppError> {
    let handle = state.sessions.get(session_id).await?;
    let mut session = handle.lock().await;
    let user_id = session.user.id;
    let user = state
        .profiles
        .get(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
    session.user = user.clone();
    Ok(Json(user))
}

/// DELETE /api/v1/sessions/:sid
pub async fn handle_sign_out(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(session_id).await {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }
    info!("Closed session {session_id}");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/sessions/:sid/api-key
///
/// The key lives in the session only and is never written to the profile store.
pub async fn handle_set_api_key(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ApiKeyRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    let api_key = request.api_key.trim();
    if api_key.is_empty() {
        return Err(AppError::Validation("api_key cannot be empty".to_string()));
    }

    let handle = state.sessions.get(session_id).await?;
    let mut session = handle.lock().await;
    session.set_credential(Credential::new(api_key));
    Ok(Json(session.summary()))
}

/// POST /api/v1/sessions/:sid/resume
///
/// Multipart upload with a single file field. The extracted text replaces the stored résumé.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionSummary>, AppError> {
    let handle = state.sessions.get(session_id).await?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
        .ok_or_else(|| AppError::Validation("No resume file in upload".to_string()))?;

    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let format = ResumeFormat::detect(file_name.as_deref(), content_type.as_deref())?;
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

    let resume_text = tokio::task::spawn_blocking(move || extract_resume_text(format, &bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Resume extraction task failed: {e}")))??;

    let mut session = handle.lock().await;
    let user = state
        .profiles
        .save_resume_text(session.user.id, &resume_text)
        .await?;
    session.user = user;
    info!("Stored resume text for user {}", session.user.id);
    Ok(Json(session.summary()))
}

/// PUT /api/v1/sessions/:sid/preferences
pub async fn handle_save_preferences(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(preferences): Json<JobPreferences>,
) -> Result<Json<SessionSummary>, AppError> {
    preferences.validate()?;

    let handle = state.sessions.get(session_id).await?;
    let mut session = handle.lock().await;
    let user = state
        .profiles
        .save_preferences(session.user.id, &preferences)
        .await?;
    session.user = user;
    Ok(Json(session.summary()))
}

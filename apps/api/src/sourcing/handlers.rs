//! Axum route handlers for job sourcing.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::sourcing::JobPosting;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobListingsResponse {
    pub listings: Vec<JobPosting>,
}

/// POST /api/v1/sessions/:sid/jobs/scrape
///
/// Finds postings matching the session's résumé and replaces the session's listings.
pub async fn handle_scrape_jobs(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<JobListingsResponse>, AppError> {
    let handle = state.sessions.get(session_id).await?;
    let mut session = handle.lock().await;

    let credential = session.credential()?.clone();
    let resume_text = session.resume_text()?.to_string();

    let listings = state.job_source.find_jobs(&resume_text, &credential).await?;
    info!("Session {} now has {} listings", session.id, listings.len());
    session.listings = listings.clone();

    Ok(Json(JobListingsResponse { listings }))
}

/// GET /api/v1/sessions/:sid/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<JobListingsResponse>, AppError> {
    let handle = state.sessions.get(session_id).await?;
    let session = handle.lock().await;
    Ok(Json(JobListingsResponse {
        listings: session.listings.clone(),
    }))
}

pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::generation::handlers as generation;
use crate::session::handlers as session;
use crate::sourcing::handlers as sourcing;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(session::handle_sign_in))
        .route(
            "/api/v1/sessions/:sid",
            get(session::handle_get_session).delete(session::handle_sign_out),
        )
        .route(
            "/api/v1/sessions/:sid/profile",
            get(session::handle_get_profile),
        )
        .route(
            "/api/v1/sessions/:sid/api-key",
            put(session::handle_set_api_key),
        )
        .route(
            "/api/v1/sessions/:sid/resume",
            post(session::handle_upload_resume),
        )
        .route(
            "/api/v1/sessions/:sid/preferences",
            put(session::handle_save_preferences),
        )
        // Job sourcing
        .route(
            "/api/v1/sessions/:sid/jobs/scrape",
            post(sourcing::handle_scrape_jobs),
        )
        .route("/api/v1/sessions/:sid/jobs", get(sourcing::handle_list_jobs))
        // Documents
        .route(
            "/api/v1/sessions/:sid/jobs/:index/documents",
            post(generation::handle_generate_documents),
        )
        .route(
            "/api/v1/documents/:name",
            get(generation::handle_download_document),
        )
        .route(
            "/api/v1/documents/:name/pdf",
            get(generation::handle_download_pdf),
        )
        .with_state(state)
}

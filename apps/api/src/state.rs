use std::sync::Arc;

use crate::config::Config;
use crate::generation::engine::GenerationEngine;
use crate::generation::templates::TemplateStore;
use crate::llm_client::assistants::AssistantService;
use crate::profiles::ProfileStore;
use crate::session::SessionStore;
use crate::sourcing::JobSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable profile store. Postgres when DATABASE_URL is set, in-memory otherwise.
    pub profiles: Arc<dyn ProfileStore>,
    pub sessions: SessionStore,
    /// Used directly only for assistant registration; generation goes through `engine`.
    pub assistants: Arc<dyn AssistantService>,
    pub engine: GenerationEngine,
    pub templates: Arc<TemplateStore>,
    pub job_source: Arc<dyn JobSource>,
}

mod config;
mod db;
mod errors;
mod generation;
mod intake;
mod llm_client;
mod profiles;
mod render;
mod routes;
mod session;
mod sourcing;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::generation::engine::GenerationEngine;
use crate::generation::templates::TemplateStore;
use crate::llm_client::OpenAiClient;
use crate::profiles::{InMemoryProfileStore, PgProfileStore, ProfileStore};
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::sourcing::{HttpPageFetcher, LlmJobSource};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Profile store: PostgreSQL when configured, otherwise process memory
    let profiles: Arc<dyn ProfileStore> = match &config.database_url {
        Some(url) => Arc::new(PgProfileStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; profiles are kept in memory and lost on restart");
            Arc::new(InMemoryProfileStore::default())
        }
    };

    // Template fragments are read once; a missing file aborts startup
    let templates = Arc::new(TemplateStore::load(&config.templates).await?);

    // One OpenAI client serves both the Assistants and chat surfaces
    let openai = Arc::new(OpenAiClient::new(config.openai_api_base.clone())?);
    info!("OpenAI client initialized (base: {})", config.openai_api_base);

    let engine = GenerationEngine::new(openai.clone(), config.document_sink(), config.poll.clone());
    info!(
        "Generation engine ready (output: {:?}, poll timeout: {:?})",
        config.output_mode, config.poll.timeout
    );

    let job_source = Arc::new(LlmJobSource::new(
        openai.clone(),
        Arc::new(HttpPageFetcher::new()?),
        config.max_job_listings,
    ));

    // Build app state
    let state = AppState {
        config: config.clone(),
        profiles,
        sessions: SessionStore::default(),
        assistants: openai,
        engine,
        templates,
        job_source,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Idempotent schema for the profile store. One row per user, merge-style updates.
const PROFILE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS user_profiles (
    id           UUID PRIMARY KEY,
    email        TEXT NOT NULL UNIQUE,
    resume_text  TEXT,
    preferences  JSONB,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at   TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Creates a PostgreSQL connection pool and makes sure the profile table exists.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    sqlx::query(PROFILE_SCHEMA)
        .execute(&pool)
        .await
        .context("Failed to create user_profiles table")?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

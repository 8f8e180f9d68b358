use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::profiles::{normalize_email, JobPreferences, ProfileStore, UserProfile};

#[derive(Debug, Clone, FromRow)]
struct UserProfileRow {
    id: Uuid,
    email: String,
    resume_text: Option<String>,
    preferences: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        let preferences = row.preferences.and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| warn!("Ignoring malformed preferences for user {}: {e}", row.id))
                .ok()
        });
        UserProfile {
            id: row.id,
            email: row.email,
            resume_text: row.resume_text,
            preferences,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Profile store backed by the `user_profiles` table (see `db::create_pool`).
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_or_create(&self, email: &str) -> Result<UserProfile, AppError> {
        let email = normalize_email(email)?;
        let row: UserProfileRow = sqlx::query_as(
            r#"
            INSERT INTO user_profiles (id, email)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET updated_at = user_profiles.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let row: Option<UserProfileRow> =
            sqlx::query_as("SELECT * FROM user_profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(UserProfile::from))
    }

    async fn save_resume_text(&self, id: Uuid, resume_text: &str) -> Result<UserProfile, AppError> {
        let row: Option<UserProfileRow> = sqlx::query_as(
            r#"
            UPDATE user_profiles
            SET resume_text = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(resume_text)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
    }

    async fn save_preferences(
        &self,
        id: Uuid,
        preferences: &JobPreferences,
    ) -> Result<UserProfile, AppError> {
        preferences.validate()?;
        let value = serde_json::to_value(preferences)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize preferences: {e}")))?;
        let row: Option<UserProfileRow> = sqlx::query_as(
            r#"
            UPDATE user_profiles
            SET preferences = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&value)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
    }
}

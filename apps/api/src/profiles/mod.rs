//! Profile Store — per-user résumé text and job preferences.
//!
//! Identity itself is external; users are keyed by email and created on first sign-in.
//! `AppState` holds an `Arc<dyn ProfileStore>`: Postgres when `DATABASE_URL` is set,
//! in-memory otherwise.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;

pub mod postgres;

pub use postgres::PgProfileStore;

/// What the user is looking for. All four fields are required when saving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPreferences {
    pub job_title: String,
    pub location: String,
    pub salary_expectations: String,
    pub availability: String,
}

impl JobPreferences {
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("job_title", &self.job_title),
            ("location", &self.location),
            ("salary_expectations", &self.salary_expectations),
            ("availability", &self.availability),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Job preferences missing: {}",
                missing.join(", ")
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub resume_text: Option<String>,
    pub preferences: Option<JobPreferences>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    fn new(email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            resume_text: None,
            preferences: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Normalises and sanity-checks an email used as the identity key.
pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(email)
    } else {
        Err(AppError::Validation(format!("'{email}' is not a valid email")))
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the profile for `email`, creating an empty one on first sign-in.
    async fn find_or_create(&self, email: &str) -> Result<UserProfile, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<UserProfile>, AppError>;

    async fn save_resume_text(&self, id: Uuid, resume_text: &str) -> Result<UserProfile, AppError>;

    async fn save_preferences(
        &self,
        id: Uuid,
        preferences: &JobPreferences,
    ) -> Result<UserProfile, AppError>;
}

/// Process-local profile store. Used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
}

impl InMemoryProfileStore {
    async fn update<F>(&self, id: Uuid, apply: F) -> Result<UserProfile, AppError>
    where
        F: FnOnce(&mut UserProfile) + Send,
    {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
        apply(profile);
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_or_create(&self, email: &str) -> Result<UserProfile, AppError> {
        let email = normalize_email(email)?;
        let mut profiles = self.profiles.write().await;
        if let Some(existing) = profiles.values().find(|p| p.email == email) {
            return Ok(existing.clone());
        }
        let profile = UserProfile::new(&email);
        profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn save_resume_text(&self, id: Uuid, resume_text: &str) -> Result<UserProfile, AppError> {
        let resume_text = resume_text.to_string();
        self.update(id, move |p| p.resume_text = Some(resume_text))
            .await
    }

    async fn save_preferences(
        &self,
        id: Uuid,
        preferences: &JobPreferences,
    ) -> Result<UserProfile, AppError> {
        preferences.validate()?;
        let preferences = preferences.clone();
        self.update(id, move |p| p.preferences = Some(preferences))
            .await
    }
}

//! Session context — the per-user working state between requests.
//!
//! Lifecycle: created at sign-in, removed at logout or replaced by the same user's
//! next sign-in. Handlers look a session up by id and lock it for the duration of
//! the request, so work within one session runs strictly one request at a time.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::registry::AssistantProfiles;
use crate::llm_client::Credential;
use crate::profiles::UserProfile;
use crate::sourcing::JobPosting;

pub mod handlers;

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub user: UserProfile,
    credential: Option<Credential>,
    pub listings: Vec<JobPosting>,
    pub assistants: AssistantProfiles,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: UserProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            credential: None,
            listings: Vec::new(),
            assistants: AssistantProfiles::default(),
            created_at: Utc::now(),
        }
    }

    /// Replaces the API key. Cached assistant profiles belong to the old key's account
    /// and are dropped when the key actually changes.
    pub fn set_credential(&mut self, credential: Credential) {
        if self.credential.as_ref() != Some(&credential) {
            self.assistants.clear();
        }
        self.credential = Some(credential);
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn credential(&self) -> Result<&Credential, AppError> {
        self.credential
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("Save your OpenAI API key first".to_string()))
    }

    pub fn resume_text(&self) -> Result<&str, AppError> {
        self.user
            .resume_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Upload your resume first".to_string()))
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            user_id: self.user.id,
            email: self.user.email.clone(),
            has_api_key: self.has_credential(),
            has_resume: self.resume_text().is_ok(),
            preferences_saved: self.user.preferences.is_some(),
            listing_count: self.listings.len(),
            assistants_registered: self.assistants.len(),
            created_at: self.created_at,
        }
    }
}

/// What clients see of a session. Never includes the API key.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub has_api_key: bool,
    pub has_resume: bool,
    pub preferences_saved: bool,
    pub listing_count: usize,
    pub assistants_registered: usize,
    pub created_at: DateTime<Utc>,
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// The owning user is kept outside the mutex so sign-in never waits on a busy session.
struct SessionEntry {
    user_id: Uuid,
    handle: SessionHandle,
}

/// At most one live session per user: signing in again replaces the previous one.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionStore {
    pub async fn create(&self, user: UserProfile) -> SessionHandle {
        let user_id = user.id;
        let session = Session::new(user);
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.user_id != user_id);
        if sessions.len() < before {
            info!("Replaced previous session for user {user_id}");
        }
        sessions.insert(
            id,
            SessionEntry {
                user_id,
                handle: handle.clone(),
            },
        );
        handle
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    /// Ends a session. Returns false if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

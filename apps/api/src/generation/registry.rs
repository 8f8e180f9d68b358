//! Assistant profile registration.
//!
//! `register_assistant` always creates a new remote assistant. Sessions go through
//! `AssistantProfiles::get_or_register`, which registers each document kind at most once.

use std::collections::HashMap;

use tracing::info;

use crate::generation::document::DocumentKind;
use crate::generation::prompts::ASSISTANT_MODEL;
use crate::llm_client::assistants::{AssistantProfile, AssistantService, AssistantSpec};
use crate::llm_client::{Credential, LlmError};

/// Registers a new assistant for `kind`. Not idempotent: every call creates a remote profile.
pub async fn register_assistant(
    service: &dyn AssistantService,
    credential: &Credential,
    kind: DocumentKind,
) -> Result<AssistantProfile, LlmError> {
    let instructions = kind.instructions();
    let spec = AssistantSpec {
        name: kind.assistant_name(),
        instructions: &instructions,
        model: ASSISTANT_MODEL,
    };
    let profile = service.create_assistant(credential, &spec).await?;
    info!("Registered {} assistant {}", kind, profile.id);
    Ok(profile)
}

/// Assistant profiles registered under one credential, keyed by document kind.
#[derive(Debug, Clone, Default)]
pub struct AssistantProfiles {
    registered: HashMap<DocumentKind, AssistantProfile>,
}

impl AssistantProfiles {
    /// Returns the cached profile for `kind`, registering one on first use.
    pub async fn get_or_register(
        &mut self,
        service: &dyn AssistantService,
        credential: &Credential,
        kind: DocumentKind,
    ) -> Result<AssistantProfile, LlmError> {
        if let Some(profile) = self.registered.get(&kind) {
            return Ok(profile.clone());
        }
        let profile = register_assistant(service, credential, kind).await?;
        self.registered.insert(kind, profile.clone());
        Ok(profile)
    }

    /// Drops every cached profile. Needed when the credential changes, since
    /// profiles belong to the account that registered them.
    pub fn clear(&mut self) {
        self.registered.clear();
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    #[cfg(test)]
    pub fn insert_for_test(&mut self, kind: DocumentKind, profile: AssistantProfile) {
        self.registered.insert(kind, profile);
    }
}

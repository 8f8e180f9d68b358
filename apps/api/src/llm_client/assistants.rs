//! Assistants surface — persistent assistant profiles, conversation threads and runs.
//!
//! Wire payloads are decoded once, here, into strict types. The generation engine only
//! ever sees `Run`, `RunStatus` and `ThreadMessage`; a payload that does not fit those
//! shapes fails with `LlmError::Decode` instead of leaking optional fields upward.

use std::fmt;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{Credential, LlmError, OpenAiClient, Surface};

/// Upper bound on messages fetched per thread. A generation thread holds three.
const MESSAGE_PAGE_LIMIT: u32 = 20;

/// Opaque thread handle assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Lifecycle of a run. Anything the service reports beyond the four expected
/// states (requires_action, cancelled, expired, incomplete, ...) lands in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Other(String),
}

impl RunStatus {
    /// True while the service is still working on the run.
    pub fn is_pending(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }
}

impl From<String> for RunStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            _ => RunStatus::Other(raw),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Queued => f.write_str("queued"),
            RunStatus::InProgress => f.write_str("in_progress"),
            RunStatus::Completed => f.write_str("completed"),
            RunStatus::Failed => f.write_str("failed"),
            RunStatus::Other(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// Image or file parts. Carried so ordering is preserved, ignored when extracting text.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl ThreadMessage {
    /// Concatenates every text part in order.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::Unsupported => None,
            })
            .collect()
    }
}

/// What to register: one persistent assistant per document kind.
#[derive(Debug, Clone, Copy)]
pub struct AssistantSpec<'a> {
    pub name: &'a str,
    pub instructions: &'a str,
    pub model: &'a str,
}

/// A registered assistant. The service owns it; we only keep the id around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantProfile {
    pub id: String,
    pub instructions: String,
    pub model_name: String,
}

/// The only capability the generation engine needs from the remote service.
#[async_trait]
pub trait AssistantService: Send + Sync {
    async fn create_assistant(
        &self,
        credential: &Credential,
        spec: &AssistantSpec<'_>,
    ) -> Result<AssistantProfile, LlmError>;

    async fn create_thread(&self, credential: &Credential) -> Result<ThreadId, LlmError>;

    async fn add_message(
        &self,
        credential: &Credential,
        thread: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<(), LlmError>;

    async fn create_run(
        &self,
        credential: &Credential,
        thread: &ThreadId,
        assistant_id: &str,
    ) -> Result<Run, LlmError>;

    async fn retrieve_run(
        &self,
        credential: &Credential,
        thread: &ThreadId,
        run_id: &str,
    ) -> Result<Run, LlmError>;

    /// Messages in the order the service lists them (newest first).
    async fn list_messages(
        &self,
        credential: &Credential,
        thread: &ThreadId,
    ) -> Result<Vec<ThreadMessage>, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireObjectId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WireAssistant {
    id: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct WireMessageList {
    data: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: Role,
    content: Vec<WireContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent {
    Text { text: WireText },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct WireText {
    value: String,
}

impl From<WireMessage> for ThreadMessage {
    fn from(wire: WireMessage) -> Self {
        ThreadMessage {
            role: wire.role,
            parts: wire
                .content
                .into_iter()
                .map(|c| match c {
                    WireContent::Text { text } => ContentPart::Text(text.value),
                    WireContent::Unsupported => ContentPart::Unsupported,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl AssistantService for OpenAiClient {
    async fn create_assistant(
        &self,
        credential: &Credential,
        spec: &AssistantSpec<'_>,
    ) -> Result<AssistantProfile, LlmError> {
        let body = json!({
            "model": spec.model,
            "name": spec.name,
            "instructions": spec.instructions,
            "tools": [],
        });
        let assistant: WireAssistant = self
            .request(
                credential,
                Surface::Assistants,
                Method::POST,
                "assistants",
                Some(&body),
            )
            .await?;
        debug!("Registered assistant '{}' as {}", spec.name, assistant.id);
        Ok(AssistantProfile {
            id: assistant.id,
            instructions: spec.instructions.to_string(),
            model_name: assistant.model,
        })
    }

    async fn create_thread(&self, credential: &Credential) -> Result<ThreadId, LlmError> {
        let thread: WireObjectId = self
            .request(
                credential,
                Surface::Assistants,
                Method::POST,
                "threads",
                Some(&json!({})),
            )
            .await?;
        Ok(ThreadId(thread.id))
    }

    async fn add_message(
        &self,
        credential: &Credential,
        thread: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<(), LlmError> {
        let body = json!({ "role": role.as_str(), "content": content });
        let _: WireObjectId = self
            .request(
                credential,
                Surface::Assistants,
                Method::POST,
                &format!("threads/{thread}/messages"),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    async fn create_run(
        &self,
        credential: &Credential,
        thread: &ThreadId,
        assistant_id: &str,
    ) -> Result<Run, LlmError> {
        let body = json!({ "assistant_id": assistant_id });
        self.request(
            credential,
            Surface::Assistants,
            Method::POST,
            &format!("threads/{thread}/runs"),
            Some(&body),
        )
        .await
    }

    async fn retrieve_run(
        &self,
        credential: &Credential,
        thread: &ThreadId,
        run_id: &str,
    ) -> Result<Run, LlmError> {
        self.request(
            credential,
            Surface::Assistants,
            Method::GET,
            &format!("threads/{thread}/runs/{run_id}"),
            None::<&()>,
        )
        .await
    }

    async fn list_messages(
        &self,
        credential: &Credential,
        thread: &ThreadId,
    ) -> Result<Vec<ThreadMessage>, LlmError> {
        let list: WireMessageList = self
            .request(
                credential,
                Surface::Assistants,
                Method::GET,
                &format!("threads/{thread}/messages?order=desc&limit={MESSAGE_PAGE_LIMIT}"),
                None::<&()>,
            )
            .await?;
        Ok(list.data.into_iter().map(ThreadMessage::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_decodes_known_states() {
        let run: Run = serde_json::from_str(r#"{"id": "run_1", "status": "in_progress"}"#).unwrap();
        assert_eq!(run.status, RunStatus::InProgress);
        assert!(run.status.is_pending());

        let run: Run = serde_json::from_str(r#"{"id": "run_1", "status": "completed"}"#).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert!(!run.status.is_pending());
    }

    #[test]
    fn test_run_status_keeps_unrecognized_value() {
        let run: Run = serde_json::from_str(r#"{"id": "run_1", "status": "requires_action"}"#).unwrap();
        assert_eq!(run.status, RunStatus::Other("requires_action".to_string()));
        assert!(!run.status.is_pending());
        assert_eq!(run.status.to_string(), "requires_action");
    }

    #[test]
    fn test_message_list_decodes_text_and_skips_images() {
        let json = r#"{
            "object": "list",
            "data": [
                {
                    "id": "msg_2",
                    "role": "assistant",
                    "content": [
                        {"type": "text", "text": {"value": "\\section{Experience}", "annotations": []}},
                        {"type": "image_file", "image_file": {"file_id": "file_1"}},
                        {"type": "text", "text": {"value": " more", "annotations": []}}
                    ]
                },
                {
                    "id": "msg_1",
                    "role": "user",
                    "content": [{"type": "text", "text": {"value": "resume", "annotations": []}}]
                }
            ]
        }"#;
        let list: WireMessageList = serde_json::from_str(json).unwrap();
        let messages: Vec<ThreadMessage> = list.data.into_iter().map(ThreadMessage::from).collect();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].parts.len(), 3);
        assert_eq!(messages[0].parts[1], ContentPart::Unsupported);
        assert_eq!(messages[0].text(), "\\section{Experience} more");
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_message_with_unknown_role_fails_fast() {
        let json = r#"{"data": [{"role": "system", "content": []}]}"#;
        assert!(serde_json::from_str::<WireMessageList>(json).is_err());
    }

    #[test]
    fn test_message_with_malformed_text_part_fails_fast() {
        let json = r#"{"data": [{"role": "assistant", "content": [{"type": "text", "text": "bare"}]}]}"#;
        assert!(serde_json::from_str::<WireMessageList>(json).is_err());
    }

    #[test]
    fn test_assistant_decodes_with_null_instructions() {
        let json = r#"{"id": "asst_1", "object": "assistant", "model": "gpt-4o", "instructions": null}"#;
        let assistant: WireAssistant = serde_json::from_str(json).unwrap();
        assert_eq!(assistant.id, "asst_1");
        assert_eq!(assistant.model, "gpt-4o");
    }
}

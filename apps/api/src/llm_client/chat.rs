//! Chat completions — single-shot system + user exchanges.
//!
//! Callers depend on the `ChatModel` trait so tests can substitute scripted replies.

use async_trait::async_trait;
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::{strip_json_fences, Credential, LlmError, OpenAiClient, Surface};

/// Model used for search-URL construction and listing extraction.
pub const CHAT_MODEL: &str = "gpt-4o";
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the trimmed text of the first choice.
    async fn complete(
        &self,
        credential: &Credential,
        system: &str,
        prompt: &str,
    ) -> Result<String, LlmError>;
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(
        &self,
        credential: &Credential,
        system: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: CHAT_MODEL,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        let response: ChatResponse = self
            .request(
                credential,
                Surface::Chat,
                Method::POST,
                "chat/completions",
                Some(&body),
            )
            .await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Chat completion: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

/// Calls the model and deserializes its reply as JSON.
/// The prompt must instruct the model to return valid JSON.
pub async fn complete_json<T: DeserializeOwned>(
    model: &dyn ChatModel,
    credential: &Credential,
    system: &str,
    prompt: &str,
) -> Result<T, LlmError> {
    let text = model.complete(credential, system, prompt).await?;
    serde_json::from_str(strip_json_fences(&text)).map_err(LlmError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedModel(&'static str);

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(&self, _: &Credential, _: &str, _: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug, Deserialize)]
    struct Payload {
        answer: u32,
    }

    #[tokio::test]
    async fn test_complete_json_strips_fences() {
        let model = CannedModel("```json\n{\"answer\": 42}\n```");
        let payload: Payload = complete_json(&model, &Credential::new("k"), "sys", "q")
            .await
            .unwrap();
        assert_eq!(payload.answer, 42);
    }

    #[tokio::test]
    async fn test_complete_json_reports_decode_error() {
        let model = CannedModel("Sure! Here is your JSON.");
        let result: Result<Payload, _> =
            complete_json(&model, &Credential::new("k"), "sys", "q").await;
        assert!(matches!(result, Err(LlmError::Decode(_))));
    }

    #[test]
    fn test_chat_response_tolerates_missing_usage() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": " hi "}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.usage.is_none());
        assert_eq!(response.choices[0].message.content.as_deref(), Some(" hi "));
    }
}

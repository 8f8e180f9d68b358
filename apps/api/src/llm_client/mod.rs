/// LLM Client — the single point of entry for all OpenAI API calls in Tailor.
///
/// ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
/// Chat completions live in `chat`, the assistants/threads/runs surface in `assistants`.
///
/// The API key belongs to the end user and is supplied per call as a `Credential`;
/// the client itself holds no key material.
use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod assistants;
pub mod chat;
pub mod prompts;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
/// Beta header required by every assistants/threads/runs endpoint.
const ASSISTANTS_BETA: &str = "assistants=v2";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Opaque API key supplied by the user. Never logged and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// Which API surface a request targets. Assistants endpoints need the beta header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Chat,
    Assistants,
}

/// Thin HTTP wrapper over the OpenAI REST API with retry and error decoding.
/// Cheap to clone; the underlying `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Sends one JSON request and decodes the JSON response into `T`.
    /// Retries on 429 (rate limit), 5xx and connection errors with exponential backoff.
    async fn request<B, T>(
        &self,
        credential: &Credential,
        surface: Surface,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, LlmError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "OpenAI call {} {} attempt {} failed, retrying after {}ms...",
                    method,
                    path,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut builder = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(credential.expose());
            if surface == Surface::Assistants {
                builder = builder.header("OpenAI-Beta", ASSISTANTS_BETA);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = match builder.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("OpenAI API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
            }

            let bytes = response.bytes().await?;
            debug!("OpenAI call {} {} succeeded ({} bytes)", method, path, bytes.len());
            return serde_json::from_slice(&bytes).map_err(LlmError::Decode);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Pulls `error.message` out of an OpenAI error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<OpenAiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("sk-very-secret");
        let printed = format!("{credential:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert_eq!(credential.expose(), "sk-very-secret");
    }

    #[test]
    fn test_error_message_prefers_structured_body() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key provided");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_client_trims_trailing_slash_from_base_url() {
        let client = OpenAiClient::new("http://localhost:9999/v1/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9999/v1");
    }
}

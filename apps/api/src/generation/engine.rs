//! Document Generation Engine — one thread, one run, one document.
//!
//! Flow: create thread → add resume message → add job description message →
//!       start run → poll until terminal (bounded) → read first assistant message →
//!       wrap with template fragments → store.
//!
//! Templates never reach the model. Every failure is returned as a `FailureReport`;
//! nothing escapes `generate` as an error or a partial document.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::generation::document::{
    FailureReason, FailureReport, GeneratedDocument, GenerationRequest,
};
use crate::generation::output::DocumentSink;
use crate::llm_client::assistants::{AssistantService, Role, Run, RunStatus, ThreadId};
use crate::llm_client::Credential;

/// How the engine waits on a run: exponential backoff, bounded by an overall deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(5),
            multiplier: 1.5,
            timeout: Duration::from_secs(300),
        }
    }
}

impl PollPolicy {
    fn next_interval(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier).min(self.max_interval)
    }
}

/// `prefix + "\n" + body + "\n" + suffix`
pub fn assemble(prefix: &str, body: &str, suffix: &str) -> String {
    format!("{prefix}\n{body}\n{suffix}")
}

#[derive(Clone)]
pub struct GenerationEngine {
    service: Arc<dyn AssistantService>,
    sink: DocumentSink,
    poll: PollPolicy,
}

impl GenerationEngine {
    pub fn new(service: Arc<dyn AssistantService>, sink: DocumentSink, poll: PollPolicy) -> Self {
        Self {
            service,
            sink,
            poll,
        }
    }

    /// Runs one generation exchange and returns the finished document or a failure report.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        credential: &Credential,
    ) -> Result<GeneratedDocument, FailureReport> {
        let kind = request.kind();
        info!("Generating {} with assistant {}", kind, request.assistant_profile_id());

        let body_text = self.converse(request, credential).await.inspect_err(|report| {
            warn!("Generation of {} failed: {}", kind, report);
        })?;

        let full_text = assemble(request.template_prefix(), &body_text, request.template_suffix());

        let storage_locator = self.sink.store(kind, &full_text).await.map_err(|e| {
            warn!("Could not store generated {}: {}", kind, e);
            FailureReport::new(FailureReason::StorageError, Some(e.to_string()))
        })?;

        info!("Generated {} ({} body chars)", kind, body_text.chars().count());

        Ok(GeneratedDocument {
            kind,
            body_text,
            full_text,
            storage_locator,
        })
    }

    /// Steps 1–5: returns the trimmed assistant body text.
    async fn converse(
        &self,
        request: &GenerationRequest,
        credential: &Credential,
    ) -> Result<String, FailureReport> {
        let thread = self
            .service
            .create_thread(credential)
            .await
            .map_err(FailureReport::transport)?;
        debug!("Created thread {}", thread);

        for content in [
            request.candidate_profile_text(),
            request.target_description_text(),
        ] {
            self.service
                .add_message(credential, &thread, Role::User, content)
                .await
                .map_err(FailureReport::transport)?;
        }

        let run = self
            .service
            .create_run(credential, &thread, request.assistant_profile_id())
            .await
            .map_err(FailureReport::transport)?;
        debug!("Started run {} on thread {}", run.id, thread);

        let run = match tokio::time::timeout(
            self.poll.timeout,
            self.poll_until_terminal(credential, &thread, run),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(FailureReport::new(
                    FailureReason::TimedOut,
                    Some(format!(
                        "run still pending after {}s",
                        self.poll.timeout.as_secs()
                    )),
                ))
            }
        };

        if run.status != RunStatus::Completed {
            return Err(FailureReport::new(
                FailureReason::RunDidNotComplete,
                Some(run.status.to_string()),
            ));
        }

        let messages = self
            .service
            .list_messages(credential, &thread)
            .await
            .map_err(FailureReport::transport)?;

        let body = messages
            .iter()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.text())
            .unwrap_or_default();
        let body = body.trim();

        if body.is_empty() {
            return Err(FailureReport::new(FailureReason::EmptyGeneration, None));
        }

        Ok(body.to_string())
    }

    async fn poll_until_terminal(
        &self,
        credential: &Credential,
        thread: &ThreadId,
        mut run: Run,
    ) -> Result<Run, FailureReport> {
        let mut interval = self.poll.initial_interval;
        while run.status.is_pending() {
            debug!("Run {} is {}; checking again in {:?}", run.id, run.status, interval);
            tokio::time::sleep(interval).await;
            interval = self.poll.next_interval(interval);
            run = self
                .service
                .retrieve_run(credential, thread, &run.id)
                .await
                .map_err(FailureReport::transport)?;
        }
        Ok(run)
    }
}

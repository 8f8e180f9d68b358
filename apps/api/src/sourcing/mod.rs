//! Job Sourcing — turns a résumé into a list of job postings.
//!
//! Flow: LLM builds a job bank search URL → fetch the results page →
//!       LLM extracts postings as JSON → cap at `max_listings`.
//!
//! Pluggable via `JobSource`; `AppState` holds an `Arc<dyn JobSource>`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::chat::{complete_json, ChatModel};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{Credential, LlmError};
use crate::sourcing::prompts::{EXTRACTION_PROMPT_TEMPLATE, EXTRACTION_SYSTEM, SEARCH_URL_SYSTEM};

pub mod handlers;
pub mod prompts;

/// Only search URLs on this host are fetched.
pub const JOB_BANK_HOST: &str = "jobbank.gc.ca";
/// Page HTML beyond this many characters is cut before prompting.
const MAX_PAGE_CHARS: usize = 60_000;
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub posted_on: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedPostings {
    #[serde(default)]
    job_postings: Vec<JobPosting>,
}

#[derive(Debug, Error)]
pub enum SourcingError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Model did not return a usable job bank link: {0:?}")]
    InvalidSearchUrl(String),

    #[error("Fetching {url} failed: {message}")]
    Fetch { url: String, message: String },
}

impl From<SourcingError> for AppError {
    fn from(e: SourcingError) -> Self {
        AppError::Llm(format!("Job sourcing failed: {e}"))
    }
}

#[async_trait]
pub trait JobSource: Send + Sync {
    async fn find_jobs(
        &self,
        resume_text: &str,
        credential: &Credential,
    ) -> Result<Vec<JobPosting>, SourcingError>;
}

/// Fetches a page as text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, SourcingError>;
}

#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(FETCH_TIMEOUT).build()?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, SourcingError> {
        let fetch_error = |e: reqwest::Error| SourcingError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        };
        self.client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_error)?
            .text()
            .await
            .map_err(fetch_error)
    }
}

pub struct LlmJobSource {
    chat: Arc<dyn ChatModel>,
    fetcher: Arc<dyn PageFetcher>,
    max_listings: usize,
}

impl LlmJobSource {
    pub fn new(chat: Arc<dyn ChatModel>, fetcher: Arc<dyn PageFetcher>, max_listings: usize) -> Self {
        Self {
            chat,
            fetcher,
            max_listings,
        }
    }

    async fn search_url(&self, resume_text: &str, credential: &Credential) -> Result<Url, SourcingError> {
        let reply = self
            .chat
            .complete(credential, SEARCH_URL_SYSTEM, resume_text)
            .await?;
        parse_search_url(&reply)
    }
}

#[async_trait]
impl JobSource for LlmJobSource {
    async fn find_jobs(
        &self,
        resume_text: &str,
        credential: &Credential,
    ) -> Result<Vec<JobPosting>, SourcingError> {
        let search_url = self.search_url(resume_text, credential).await?;
        info!("Job search URL: {}", search_url);

        let page = self.fetcher.fetch(&search_url).await?;
        let page = truncate_chars(&page, MAX_PAGE_CHARS);

        let system = format!("{EXTRACTION_SYSTEM} {JSON_ONLY_SYSTEM}");
        let prompt = EXTRACTION_PROMPT_TEMPLATE
            .replace("{max_listings}", &self.max_listings.to_string())
            .replace("{source_url}", search_url.as_str())
            .replace("{page}", page);

        let extracted: ExtractedPostings =
            complete_json(self.chat.as_ref(), credential, &system, &prompt).await?;

        let postings: Vec<JobPosting> = extracted
            .job_postings
            .into_iter()
            .filter(|p| !p.title.trim().is_empty())
            .take(self.max_listings)
            .map(|p| absolutize(p, &search_url))
            .collect();

        info!("Sourced {} job postings", postings.len());
        Ok(postings)
    }
}

/// Accepts only an http(s) URL on the job bank host. Tolerates surrounding whitespace,
/// quotes and angle brackets the model sometimes adds.
pub fn parse_search_url(reply: &str) -> Result<Url, SourcingError> {
    let candidate = reply
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '<' || c == '>' || c == '`');
    let url = Url::parse(candidate)
        .map_err(|_| SourcingError::InvalidSearchUrl(reply.to_string()))?;

    let on_job_bank = url
        .host_str()
        .is_some_and(|h| h == JOB_BANK_HOST || h.ends_with(&format!(".{JOB_BANK_HOST}")));
    if !matches!(url.scheme(), "http" | "https") || !on_job_bank {
        return Err(SourcingError::InvalidSearchUrl(reply.to_string()));
    }
    Ok(url)
}

/// Resolves a relative posting URL against the page it was found on.
fn absolutize(mut posting: JobPosting, base: &Url) -> JobPosting {
    if !posting.url.is_empty() && Url::parse(&posting.url).is_err() {
        match base.join(&posting.url) {
            Ok(resolved) => posting.url = resolved.to_string(),
            Err(e) => warn!("Could not resolve posting URL {:?}: {e}", posting.url),
        }
    }
    posting
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Replies in order and records every user prompt it was given.
    struct ScriptedChat {
        replies: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedChat {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        async fn complete(&self, _: &Credential, _: &str, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies.lock().unwrap().pop().ok_or(LlmError::EmptyContent)
        }
    }

    struct StaticPage(&'static str);

    #[async_trait]
    impl PageFetcher for StaticPage {
        async fn fetch(&self, _: &Url) -> Result<String, SourcingError> {
            Ok(self.0.to_string())
        }
    }

    const SEARCH_URL: &str =
        "https://www.jobbank.gc.ca/jobsearch/jobsearch?searchstring=software+developer&locationstring=toronto";

    fn postings_json(count: usize) -> String {
        let postings: Vec<_> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "title": format!("Developer {i}"),
                    "company": "Example Corp",
                    "location": "Toronto (ON)",
                    "description": "Build things in Rust.",
                    "url": format!("/jobsearch/jobposting/{i}"),
                    "posted_on": null
                })
            })
            .collect();
        serde_json::json!({ "job_postings": postings }).to_string()
    }

    #[tokio::test]
    async fn test_find_jobs_caps_and_resolves_urls() {
        let extraction = postings_json(30);
        let chat = Arc::new(ScriptedChat::new(&[SEARCH_URL, extraction.as_str()]));
        let source = LlmJobSource::new(chat.clone(), Arc::new(StaticPage("<html></html>")), 25);

        let postings = source
            .find_jobs("Rust developer in Toronto", &Credential::new("k"))
            .await
            .unwrap();

        assert_eq!(postings.len(), 25);
        assert_eq!(
            postings[3].url,
            "https://www.jobbank.gc.ca/jobsearch/jobposting/3"
        );
        let prompts = chat.prompts.lock().unwrap();
        assert_eq!(prompts[0], "Rust developer in Toronto");
        assert!(prompts[1].contains("at most 25"));
        assert!(prompts[1].contains(SEARCH_URL));
    }

    #[tokio::test]
    async fn test_find_jobs_rejects_chatty_search_reply() {
        let chat = Arc::new(ScriptedChat::new(&["Here's the link: https://example.com/jobs"]));
        let source = LlmJobSource::new(chat, Arc::new(StaticPage("")), 25);

        let result = source.find_jobs("resume", &Credential::new("k")).await;
        assert!(matches!(result, Err(SourcingError::InvalidSearchUrl(_))));
    }

    #[tokio::test]
    async fn test_find_jobs_with_empty_page_returns_nothing() {
        let chat = Arc::new(ScriptedChat::new(&[SEARCH_URL, r#"{"job_postings": []}"#]));
        let source = LlmJobSource::new(chat, Arc::new(StaticPage("<html></html>")), 25);

        let postings = source.find_jobs("resume", &Credential::new("k")).await.unwrap();
        assert!(postings.is_empty());
    }

    #[test]
    fn test_parse_search_url_accepts_quoted_job_bank_link() {
        let url = parse_search_url(&format!("  \"{SEARCH_URL}\"\n")).unwrap();
        assert_eq!(url.host_str(), Some("www.jobbank.gc.ca"));
    }

    #[test]
    fn test_parse_search_url_rejects_other_hosts() {
        assert!(parse_search_url("https://evil.example.com/?q=jobbank.gc.ca").is_err());
        assert!(parse_search_url("https://notjobbank.gc.ca.evil.com/").is_err());
        assert!(parse_search_url("ftp://www.jobbank.gc.ca/").is_err());
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("résumé", 3), "rés");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_posting_defaults_missing_fields() {
        let posting: JobPosting = serde_json::from_str(r#"{"title": "Welder"}"#).unwrap();
        assert_eq!(posting.title, "Welder");
        assert!(posting.description.is_empty());
        assert!(posting.posted_on.is_none());
    }
}

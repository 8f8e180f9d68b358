use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::generation::engine::PollPolicy;
use crate::generation::output::DocumentSink;
use crate::generation::templates::TemplatePaths;
use crate::llm_client::DEFAULT_API_BASE;

/// How generated documents are handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    File,
    DataUrl,
}

impl std::str::FromStr for OutputMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(OutputMode::File),
            "data-url" | "data_url" => Ok(OutputMode::DataUrl),
            other => bail!("OUTPUT_MODE must be 'file' or 'data-url', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_base: String,
    /// None means profiles live in memory only.
    pub database_url: Option<String>,
    pub templates: TemplatePaths,
    pub output_dir: PathBuf,
    pub output_mode: OutputMode,
    pub poll: PollPolicy,
    pub max_job_listings: usize,
    pub pdflatex_bin: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let poll = PollPolicy {
            initial_interval: Duration::from_millis(parse_env("POLL_INTERVAL_MS", 1000)?),
            max_interval: Duration::from_millis(parse_env("POLL_MAX_INTERVAL_MS", 5000)?),
            timeout: Duration::from_secs(parse_env("POLL_TIMEOUT_SECS", 300)?),
            ..PollPolicy::default()
        };
        if poll.initial_interval.is_zero() || poll.max_interval < poll.initial_interval {
            bail!("POLL_INTERVAL_MS must be positive and no larger than POLL_MAX_INTERVAL_MS");
        }

        Ok(Config {
            openai_api_base: optional_env("OPENAI_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            database_url: optional_env("DATABASE_URL"),
            templates: TemplatePaths {
                resume_prefix: require_env("RESUME_PREFIX_PATH")?.into(),
                resume_suffix: require_env("RESUME_SUFFIX_PATH")?.into(),
                cover_letter_prefix: require_env("COVER_LETTER_PREFIX_PATH")?.into(),
                cover_letter_suffix: require_env("COVER_LETTER_SUFFIX_PATH")?.into(),
            },
            output_dir: optional_env("OUTPUT_DIR")
                .unwrap_or_else(|| "./generated".to_string())
                .into(),
            output_mode: optional_env("OUTPUT_MODE")
                .map(|v| v.parse::<OutputMode>())
                .transpose()?
                .unwrap_or(OutputMode::File),
            poll,
            max_job_listings: parse_env("MAX_JOB_LISTINGS", 25)?,
            pdflatex_bin: optional_env("PDFLATEX_BIN").unwrap_or_else(|| "pdflatex".to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn document_sink(&self) -> DocumentSink {
        match self.output_mode {
            OutputMode::File => DocumentSink::Directory(self.output_dir.clone()),
            OutputMode::DataUrl => DocumentSink::DataUrl,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} must be a valid number, got '{raw}': {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_parses_both_spellings() {
        assert_eq!("file".parse::<OutputMode>().unwrap(), OutputMode::File);
        assert_eq!("Data-URL".parse::<OutputMode>().unwrap(), OutputMode::DataUrl);
        assert_eq!("data_url".parse::<OutputMode>().unwrap(), OutputMode::DataUrl);
        assert!("s3".parse::<OutputMode>().is_err());
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("TAILOR_TEST_SURELY_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}

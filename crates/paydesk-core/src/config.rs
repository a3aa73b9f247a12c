//! Configuration module
//!
//! Client settings come from the environment (a `.env` file is honoured).
//! See [`ClientConfig::from_env`] for the variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_API_VERSION: &str = "v1";
const HTTP_TIMEOUT_SECS: u64 = 30;
const BLOB_URL_TTL_SECS: u64 = 5;
const STATE_DIR_NAME: &str = ".paydesk";
const STATE_FILE_NAME: &str = "state.json";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_version: String,
    pub api_token: Option<String>,
    pub state_dir: PathBuf,
    pub http_timeout_secs: u64,
    pub blob_url_ttl_secs: u64,
    pub default_company: Option<String>,
}

impl ClientConfig {
    /// Load from `PAYDESK_*` environment variables, after reading `.env`.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = var("PAYDESK_API_URL")
            .or_else(|| var("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_version = var("PAYDESK_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let state_dir = match var("PAYDESK_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(STATE_DIR_NAME),
        };

        let http_timeout_secs = match var("PAYDESK_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid PAYDESK_HTTP_TIMEOUT_SECS: {}", raw))?,
            None => HTTP_TIMEOUT_SECS,
        };
        let blob_url_ttl_secs = match var("PAYDESK_BLOB_URL_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid PAYDESK_BLOB_URL_TTL_SECS: {}", raw))?,
            None => BLOB_URL_TTL_SECS,
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_version,
            api_token: var("PAYDESK_API_TOKEN"),
            state_dir,
            http_timeout_secs,
            blob_url_ttl_secs,
            default_company: var("PAYDESK_DEFAULT_COMPANY"),
        })
    }

    /// API path prefix, e.g. `/api/v1`.
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn blob_url_ttl(&self) -> Duration {
        Duration::from_secs(self.blob_url_ttl_secs)
    }

    /// File behind the persistent key-value store.
    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join(STATE_FILE_NAME)
    }
}

//! Breached password lookup over the k-anonymity range API.
//!
//! Only the first 5 characters of the uppercase SHA-1 digest leave the process.
//! The endpoint answers with every known suffix sharing that prefix and the match
//! is done locally.

use pwgate_core::PasswordConfig;
use sha1::{Digest, Sha1};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Characters of the digest sent to the range endpoint
pub const PREFIX_LEN: usize = 5;

#[derive(Error, Debug)]
pub enum BreachError {
    #[error("BREACH/CLIENT: {0}")]
    Client(String),

    #[error("BREACH/TRANSPORT: {0}")]
    Transport(String),

    #[error("BREACH/STATUS: {0}")]
    Status(u16),

    #[error("BREACH/BODY: {0}")]
    Body(String),
}

/// Split a password digest into the public prefix and the private suffix
pub fn range_key(password: &str) -> (String, String) {
    let hash = hex::encode(Sha1::digest(password.as_bytes())).to_uppercase();
    let (prefix, suffix) = hash.split_at(PREFIX_LEN);
    (prefix.to_string(), suffix.to_string())
}

/// Fetches the candidate suffix list for a digest prefix
pub trait RangeLookup: Send + Sync {
    fn fetch_range(&self, prefix: &str) -> Result<String, BreachError>;
}

/// Blocking HTTP implementation of [`RangeLookup`]
pub struct HttpRangeLookup {
    client: reqwest::blocking::Client,
    base_url: String,
    user_agent: String,
}

impl HttpRangeLookup {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, BreachError> {
        // None disables the blocking client's built-in 30s limit
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BreachError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        })
    }

    pub fn from_config(config: &PasswordConfig) -> Result<Self, BreachError> {
        Self::new(
            config.breach_api_base_url.clone(),
            config.user_agent.clone(),
            config.breach_api_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl RangeLookup for HttpRangeLookup {
    fn fetch_range(&self, prefix: &str) -> Result<String, BreachError> {
        let url = format!("{}/{}", self.base_url, prefix);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .map_err(|e| BreachError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BreachError::Status(status.as_u16()));
        }

        response.text().map_err(|e| BreachError::Body(e.to_string()))
    }
}

/// Answers "has this password been seen in a breach?"
#[derive(Clone)]
pub struct BreachChecker {
    lookup: Arc<dyn RangeLookup>,
}

impl BreachChecker {
    pub fn new(lookup: Arc<dyn RangeLookup>) -> Self {
        Self { lookup }
    }

    pub fn from_config(config: &PasswordConfig) -> Result<Self, BreachError> {
        Ok(Self::new(Arc::new(HttpRangeLookup::from_config(config)?)))
    }

    pub fn is_compromised(&self, password: &str) -> Result<bool, BreachError> {
        let (prefix, suffix) = range_key(password);
        let body = self.lookup.fetch_range(&prefix)?;
        let found = body.lines().any(|line| {
            line.split(':')
                .next()
                .is_some_and(|candidate| candidate.trim().eq_ignore_ascii_case(&suffix))
        });
        debug!(prefix = %prefix, candidates = body.lines().count(), found, "breach range checked");
        Ok(found)
    }
}

//! Password Configuration
//!
//! Static settings injected into the handlers when a chain is built. Values come
//! from defaults, then an optional YAML file, then `PWGATE_*` environment variables.

use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BREACH_API_BASE_URL: &str = "https://api.pwnedpasswords.com/range";

/// Printable ASCII without whitespace
pub const DEFAULT_PASSWORD_PATTERN: &str = r"[\x21-\x7E]+";

/// Class matched by any special (non-alphanumeric) character
pub const DEFAULT_SPECIAL_CLASS: &str = "[^A-Za-z0-9]";

const ENV_PREFIX: &str = "PWGATE_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordConfig {
    pub min_password_length: usize,
    pub max_password_length: usize,

    /// Full-match pattern restricting the permitted alphabet
    pub password_regex_pattern: String,

    /// Each pattern must occur at least once in the password
    pub required_character_classes: Vec<String>,

    pub password_update_time_interval_seconds: u64,
    pub max_consecutive_username_letters: usize,

    pub breach_check_enabled: bool,
    pub breach_api_base_url: String,

    /// Unset means the breach lookup carries no timeout of its own
    pub breach_api_timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_password_length: 8,
            max_password_length: 64,
            password_regex_pattern: DEFAULT_PASSWORD_PATTERN.to_string(),
            required_character_classes: vec![
                "[A-Z]".to_string(),
                "[a-z]".to_string(),
                "[0-9]".to_string(),
                DEFAULT_SPECIAL_CLASS.to_string(),
            ],
            password_update_time_interval_seconds: 86_400,
            max_consecutive_username_letters: 3,
            breach_check_enabled: true,
            breach_api_base_url: DEFAULT_BREACH_API_BASE_URL.to_string(),
            breach_api_timeout_secs: None,
            user_agent: format!("pwgate/{}", crate::PWGATE_VERSION),
        }
    }
}

impl PasswordConfig {
    /// Parse a YAML document; missing fields keep their defaults
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Defaults, then the optional file, then process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                serde_yaml::from_str(&raw)?
            }
            None => Self::default(),
        };
        let config = base.with_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PWGATE_*` overrides read through `lookup`
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("MIN_PASSWORD_LENGTH") {
            self.min_password_length = parse_env("MIN_PASSWORD_LENGTH", &v)?;
        }
        if let Some(v) = var("MAX_PASSWORD_LENGTH") {
            self.max_password_length = parse_env("MAX_PASSWORD_LENGTH", &v)?;
        }
        if let Some(v) = var("PASSWORD_REGEX_PATTERN") {
            self.password_regex_pattern = v;
        }
        if let Some(v) = var("PASSWORD_UPDATE_TIME_INTERVAL_SECONDS") {
            self.password_update_time_interval_seconds =
                parse_env("PASSWORD_UPDATE_TIME_INTERVAL_SECONDS", &v)?;
        }
        if let Some(v) = var("MAX_CONSECUTIVE_USERNAME_LETTERS") {
            self.max_consecutive_username_letters =
                parse_env("MAX_CONSECUTIVE_USERNAME_LETTERS", &v)?;
        }
        if let Some(v) = var("BREACH_CHECK_ENABLED") {
            self.breach_check_enabled = parse_env("BREACH_CHECK_ENABLED", &v)?;
        }
        if let Some(v) = var("BREACH_API_BASE_URL") {
            self.breach_api_base_url = v;
        }
        if let Some(v) = var("BREACH_API_TIMEOUT_SECS") {
            self.breach_api_timeout_secs = Some(parse_env("BREACH_API_TIMEOUT_SECS", &v)?);
        }

        Ok(self)
    }

    /// Reject settings the handlers cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_password_length < self.min_password_length {
            return Err(ConfigError::Invalid(format!(
                "maxPasswordLength ({}) is below minPasswordLength ({})",
                self.max_password_length, self.min_password_length
            )));
        }
        if self.breach_check_enabled && self.breach_api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "breachApiBaseUrl must be set when the breach check is enabled".to_string(),
            ));
        }
        Regex::new(&self.password_regex_pattern)?;
        for class in &self.required_character_classes {
            Regex::new(class)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::Invalid(format!("{}{} has an invalid value: {:?}", ENV_PREFIX, name, raw))
    })
}

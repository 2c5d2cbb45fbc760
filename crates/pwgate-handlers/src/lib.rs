//! pwgate Handlers: the links of the password validation chain.
//!
//! Every handler is immutable after construction and reads only the context it
//! is given, so one chain can serve concurrent calls.
//!
//! # Chain Flow
//!
//! ```text
//! Request → Recency → Length/Pattern → Username → Compromised → Allow
//!              ↓            ↓              ↓            ↓
//!            Deny         Deny           Deny         Deny (fail-open on lookup error)
//! ```

pub mod breach;
mod compromised;
mod length_pattern;
mod profile;
mod recency;
mod username;

pub use breach::{range_key, BreachChecker, BreachError, HttpRangeLookup, RangeLookup};
pub use compromised::CompromisedPasswordHandler;
pub use length_pattern::LengthPatternHandler;
pub use recency::RecencyHandler;
pub use username::UsernameSequenceHandler;

use profile::{apply_character_rules, Complexity, SpecialChars};

use pwgate_core::{
    keys, HandlerError, PasswordConfig, PasswordHandler, PolicyRecord, ValidationChain,
};
use tracing::{debug, warn};

// ============================================================================
// CHAIN BUILDER
// ============================================================================

/// Builds the fixed-order validation chain from static configuration, optionally
/// overlaid with the stored policy records.
pub struct ChainBuilder {
    config: PasswordConfig,
    breach: Option<BreachChecker>,
    username_check: bool,
}

impl ChainBuilder {
    pub fn new(config: PasswordConfig) -> Self {
        Self {
            config,
            breach: None,
            username_check: true,
        }
    }

    /// Use this checker instead of an HTTP client built from the config
    pub fn with_breach_checker(mut self, checker: BreachChecker) -> Self {
        self.breach = Some(checker);
        self
    }

    /// Overlay stored policy records onto the static configuration.
    ///
    /// `size` supplies the length bounds, `complexity` and `specialChars` the alphabet
    /// and required character classes, and `usernameSequenceExclusion` the username
    /// threshold. A disabled `usernameSequenceExclusion` drops the username handler.
    pub fn with_policies(mut self, records: &[PolicyRecord]) -> Self {
        let mut complexity = None;
        let mut specials = None;

        for record in records {
            let rules = record.rules();
            match record.key.as_str() {
                keys::SIZE if record.is_enabled() => {
                    if let Some(min) = non_negative(&record.key, "minLength", rules.get_int("minLength")) {
                        self.config.min_password_length = min;
                    }
                    if let Some(max) = non_negative(&record.key, "maxLength", rules.get_int("maxLength")) {
                        self.config.max_password_length = max;
                    }
                }
                keys::COMPLEXITY => complexity = Some(Complexity::from_record(record)),
                keys::SPECIAL_CHARS => specials = SpecialChars::from_record(record),
                keys::USERNAME_SEQUENCE_EXCLUSION => {
                    self.username_check = record.is_enabled();
                    if let Some(n) = non_negative(
                        &record.key,
                        "maxConsecutiveLetters",
                        rules.get_int("maxConsecutiveLetters"),
                    ) {
                        self.config.max_consecutive_username_letters = n;
                    }
                }
                _ => {}
            }
        }

        apply_character_rules(&mut self.config, complexity, specials.as_ref());
        self
    }

    /// Effective configuration after overlays
    pub fn config(&self) -> &PasswordConfig {
        &self.config
    }

    pub fn build(self) -> Result<ValidationChain, HandlerError> {
        let config = self.config;
        let mut handlers: Vec<Box<dyn PasswordHandler>> = Vec::with_capacity(4);

        handlers.push(Box::new(RecencyHandler::new(
            config.password_update_time_interval_seconds,
        )));
        handlers.push(Box::new(LengthPatternHandler::from_config(&config)?));

        if self.username_check {
            handlers.push(Box::new(UsernameSequenceHandler::new(
                config.max_consecutive_username_letters,
            )));
        }

        if config.breach_check_enabled {
            let checker = match self.breach {
                Some(checker) => checker,
                None => BreachChecker::from_config(&config)
                    .map_err(|e| HandlerError::Misconfigured(e.to_string()))?,
            };
            handlers.push(Box::new(CompromisedPasswordHandler::new(checker)));
        }

        let chain = ValidationChain::new(handlers);
        debug!(chain = chain.chain_id(), "validation chain built");
        Ok(chain)
    }
}

fn non_negative(key: &str, rule: &str, value: Option<i64>) -> Option<usize> {
    let value = value?;
    match usize::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(policy = key, rule, value, "ignoring negative policy value");
            None
        }
    }
}

/// Convenience helper for the standard chain straight from configuration
pub fn default_chain(config: &PasswordConfig) -> Result<ValidationChain, HandlerError> {
    ChainBuilder::new(config.clone()).build()
}

// ============================================================================
// TESTS
// ============================================================================

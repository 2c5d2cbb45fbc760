use once_cell::sync::Lazy;
use pwgate_core::config::DEFAULT_PASSWORD_PATTERN;
use pwgate_core::{HandlerError, PasswordConfig, PasswordHandler, ValidationCode, ValidationContext};
use regex::Regex;

static DEFAULT_ALPHABET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&anchored(DEFAULT_PASSWORD_PATTERN)).expect("default password pattern compiles")
});

static DEFAULT_CLASSES: Lazy<Vec<Regex>> = Lazy::new(|| {
    PasswordConfig::default()
        .required_character_classes
        .iter()
        .map(|c| Regex::new(c).expect("default character class compiles"))
        .collect()
});

fn anchored(pattern: &str) -> String {
    format!("^(?:{})$", pattern)
}

/// Length bounds plus the permitted alphabet and required character classes.
pub struct LengthPatternHandler {
    min_length: usize,
    max_length: usize,
    alphabet: Regex,
    required_classes: Vec<Regex>,
}

impl LengthPatternHandler {
    /// Compile the configured patterns. The alphabet pattern must match the whole password.
    pub fn new(
        min_length: usize,
        max_length: usize,
        pattern: &str,
        required_classes: &[String],
    ) -> Result<Self, HandlerError> {
        let alphabet = Regex::new(&anchored(pattern))
            .map_err(|e| HandlerError::Misconfigured(format!("password pattern: {}", e)))?;

        let required_classes = required_classes
            .iter()
            .map(|c| {
                Regex::new(c).map_err(|e| {
                    HandlerError::Misconfigured(format!("character class {:?}: {}", c, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            min_length,
            max_length,
            alphabet,
            required_classes,
        })
    }

    pub fn from_config(config: &PasswordConfig) -> Result<Self, HandlerError> {
        Self::new(
            config.min_password_length,
            config.max_password_length,
            &config.password_regex_pattern,
            &config.required_character_classes,
        )
    }

    /// Default alphabet and classes with custom bounds
    pub fn with_bounds(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
            alphabet: DEFAULT_ALPHABET.clone(),
            required_classes: DEFAULT_CLASSES.clone(),
        }
    }
}

impl Default for LengthPatternHandler {
    fn default() -> Self {
        let config = PasswordConfig::default();
        Self::with_bounds(config.min_password_length, config.max_password_length)
    }
}

impl PasswordHandler for LengthPatternHandler {
    fn id(&self) -> &'static str {
        "length_pattern"
    }

    fn validate(&self, ctx: &mut ValidationContext) -> Result<bool, HandlerError> {
        let len = ctx.password.chars().count();

        if len < self.min_length {
            return Ok(ctx.reject(ValidationCode::MinLengthViolation));
        }
        if len > self.max_length {
            return Ok(ctx.reject(ValidationCode::MaxLengthViolation));
        }

        let classes_ok = self
            .required_classes
            .iter()
            .all(|class| class.is_match(&ctx.password));

        if !self.alphabet.is_match(&ctx.password) || !classes_ok {
            return Ok(ctx.reject(ValidationCode::PatternViolation));
        }

        Ok(true)
    }
}

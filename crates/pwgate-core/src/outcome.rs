//! Validation codes and the allow/deny outcome returned by the chain
use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine code reported when a password is denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    PasswordChangeTooRecent,
    MinLengthViolation,
    MaxLengthViolation,
    PatternViolation,
    UserOrPasswordNotNull,
    UsernameSequenceViolation,
    WeakPassword,
    InternalValidationError,
    ValidationTimeout,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordChangeTooRecent => "PASSWORD_CHANGE_TOO_RECENT",
            Self::MinLengthViolation => "MIN_LENGTH_VIOLATION",
            Self::MaxLengthViolation => "MAX_LENGTH_VIOLATION",
            Self::PatternViolation => "PATTERN_VIOLATION",
            Self::UserOrPasswordNotNull => "USER_OR_PASSWORD_NOT_NULL",
            Self::UsernameSequenceViolation => "USERNAME_SEQUENCE_VIOLATION",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::InternalValidationError => "INTERNAL_VALIDATION_ERROR",
            Self::ValidationTimeout => "VALIDATION_TIMEOUT",
        }
    }

    /// User-facing explanation of the code
    pub fn message(&self) -> &'static str {
        match self {
            Self::PasswordChangeTooRecent => "Password was changed too recently",
            Self::MinLengthViolation => "Password is shorter than the minimum length",
            Self::MaxLengthViolation => "Password is longer than the maximum length",
            Self::PatternViolation => "Password does not meet the character requirements",
            Self::UserOrPasswordNotNull => "Username and password must not be empty",
            Self::UsernameSequenceViolation => "Password contains a sequence taken from the username",
            Self::WeakPassword => "Password has appeared in a known data breach",
            Self::InternalValidationError => "Password could not be validated",
            Self::ValidationTimeout => "Password validation timed out",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running the validation chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ValidationCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationOutcome {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            code: None,
            message: None,
        }
    }

    pub fn deny(code: ValidationCode) -> Self {
        Self {
            allowed: false,
            code: Some(code),
            message: Some(code.message().to_string()),
        }
    }

    /// Error code as a string, empty when allowed
    pub fn error_code(&self) -> &'static str {
        self.code.map(|c| c.as_str()).unwrap_or("")
    }
}

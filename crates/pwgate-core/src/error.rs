//! Unified Error Model
use thiserror::Error;

/// Failures raised by the policy store collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("STORE/POISONED: {0}")]
    Poisoned(String),

    #[error("STORE/CODEC: {0}")]
    Codec(String),

    #[error("STORE/DUPLICATE_KEY: {0}")]
    DuplicateKey(String),
}

/// A post-merge invariant that a patched policy record failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{key}: {message}")]
pub struct StructuralViolation {
    /// Policy key the violation belongs to
    pub key: String,
    /// Short identifier of the invariant (e.g. "size.min_length")
    pub rule: String,
    /// Human-readable description
    pub message: String,
}

impl StructuralViolation {
    pub fn new(
        key: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Errors that abort a policy patch batch.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("INVALID_PATCH_OPERATION/{0}")]
    InvalidPatchOperation(String),

    #[error("PATCH_POLICY_DOES_NOT_EXIST/{0}")]
    PolicyNotFound(String),

    #[error("POLICY_STRUCTURAL_VIOLATION/{0}")]
    StructuralViolation(#[from] StructuralViolation),

    #[error("POLICY_STORE_ERROR/{0}")]
    Store(#[from] StoreError),

    #[error("SERIALIZE/{0}")]
    Serialize(String),

    #[error("INTERNAL/{0}")]
    Internal(String),
}

impl PolicyError {
    /// Machine-readable code for the error class
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPatchOperation(_) => "INVALID_PATCH_OPERATION",
            Self::PolicyNotFound(_) => "PATCH_POLICY_DOES_NOT_EXIST",
            Self::StructuralViolation(_) => "POLICY_STRUCTURAL_VIOLATION",
            Self::Store(_) => "POLICY_STORE_ERROR",
            Self::Serialize(_) => "SERIALIZE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller sent something the engine refuses (as opposed to a fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPatchOperation(_) | Self::PolicyNotFound(_) | Self::StructuralViolation(_)
        )
    }
}

/// Internal fault inside a validation handler. Never a denial.
#[derive(Error, Debug, Clone)]
pub enum HandlerError {
    #[error("HANDLER/CONFIG: {0}")]
    Misconfigured(String),

    #[error("HANDLER/EXEC: {0}")]
    ExecutionFailed(String),
}

/// Configuration loading and validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG/IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("CONFIG/YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CONFIG/REGEX: {0}")]
    Regex(#[from] regex::Error),

    #[error("CONFIG/INVALID: {0}")]
    Invalid(String),
}

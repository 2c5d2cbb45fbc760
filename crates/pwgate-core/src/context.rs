//! Validation Context: per-call state threaded through the handler chain
use crate::outcome::ValidationCode;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub username: String,
    pub password: String,
    pub last_password_change: Option<DateTime<Utc>>,
    pub error_code: Option<ValidationCode>,
    pub trace_id: String,
    /// Instant the call started; time-based checks read this instead of the clock
    pub now: DateTime<Utc>,
}

impl ValidationContext {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            last_password_change: None,
            error_code: None,
            trace_id: uuid::Uuid::new_v4().to_string(),
            now: Utc::now(),
        }
    }

    pub fn with_last_change(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.last_password_change = at;
        self
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Record a denial code and return `false` so handlers can `return Ok(ctx.reject(..))`
    pub fn reject(&mut self, code: ValidationCode) -> bool {
        self.error_code = Some(code);
        false
    }
}

/// Caller-supplied input for one validation call
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub password: String,
    #[serde(default)]
    pub last_password_change: Option<DateTime<Utc>>,
}

impl ValidationRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            last_password_change: None,
        }
    }

    pub fn changed_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_password_change = Some(at);
        self
    }

    pub fn into_context(self) -> ValidationContext {
        ValidationContext::new(self.username, self.password)
            .with_last_change(self.last_password_change)
    }
}

/// Missing and `null` credentials both become empty strings so the chain can deny them
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_null_credentials() {
        let request: ValidationRequest =
            serde_json::from_str(r#"{"username": null, "password": "Secret!123"}"#).unwrap();
        assert_eq!(request.username, "");

        let request: ValidationRequest = serde_json::from_str(r#"{"username": "alice"}"#).unwrap();
        assert_eq!(request.password, "");
        assert!(request.last_password_change.is_none());
    }

    #[test]
    fn test_request_last_change() {
        let request: ValidationRequest = serde_json::from_str(
            r#"{"username": "alice", "password": "x", "lastPasswordChange": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let ctx = request.into_context();
        assert!(ctx.last_password_change.is_some());
        assert!(ctx.error_code.is_none());
    }

    #[test]
    fn test_reject_records_code() {
        let mut ctx = ValidationContext::new("alice", "x");
        assert!(!ctx.reject(ValidationCode::WeakPassword));
        assert_eq!(ctx.error_code, Some(ValidationCode::WeakPassword));
    }
}

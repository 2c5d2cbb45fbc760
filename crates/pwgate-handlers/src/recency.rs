use chrono::Duration;
use pwgate_core::{HandlerError, PasswordHandler, ValidationCode, ValidationContext};

/// Refuses a change when the previous one happened less than `interval` ago.
///
/// Only meaningful on password change; with no previous timestamp it passes.
pub struct RecencyHandler {
    interval: Duration,
}

impl RecencyHandler {
    pub fn new(interval_seconds: u64) -> Self {
        // chrono caps durations at i64::MAX milliseconds
        let seconds = interval_seconds.min((i64::MAX / 1_000) as u64) as i64;
        Self {
            interval: Duration::seconds(seconds),
        }
    }
}

impl PasswordHandler for RecencyHandler {
    fn id(&self) -> &'static str {
        "recency"
    }

    fn validate(&self, ctx: &mut ValidationContext) -> Result<bool, HandlerError> {
        let Some(last_change) = ctx.last_password_change else {
            return Ok(true);
        };

        if ctx.now.signed_duration_since(last_change) < self.interval {
            return Ok(ctx.reject(ValidationCode::PasswordChangeTooRecent));
        }
        Ok(true)
    }
}

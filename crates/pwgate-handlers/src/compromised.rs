use crate::breach::BreachChecker;
use pwgate_core::{HandlerError, PasswordHandler, ValidationCode, ValidationContext};
use tracing::warn;

/// Rejects passwords listed by the breach range API.
///
/// Fails open: when the lookup errors the password is treated as not compromised
/// and the failure is logged.
pub struct CompromisedPasswordHandler {
    checker: BreachChecker,
}

impl CompromisedPasswordHandler {
    pub fn new(checker: BreachChecker) -> Self {
        Self { checker }
    }
}

impl PasswordHandler for CompromisedPasswordHandler {
    fn id(&self) -> &'static str {
        "compromised"
    }

    fn validate(&self, ctx: &mut ValidationContext) -> Result<bool, HandlerError> {
        match self.checker.is_compromised(&ctx.password) {
            Ok(true) => Ok(ctx.reject(ValidationCode::WeakPassword)),
            Ok(false) => Ok(true),
            Err(e) => {
                warn!(trace_id = %ctx.trace_id, error = %e, "breach lookup failed, failing open");
                Ok(true)
            }
        }
    }
}

//! Handler Trait: the contract shared by every link of the validation chain
use crate::context::ValidationContext;
use crate::error::HandlerError;

/// One link of the password validation chain
pub trait PasswordHandler: Send + Sync {
    /// Stable identifier (ex: "length_pattern")
    fn id(&self) -> &'static str;

    /// Check the password carried by `ctx`.
    ///
    /// `Ok(true)` lets the chain continue, `Ok(false)` denies and must leave a code in
    /// `ctx.error_code`. `Err` is reserved for faults inside the handler itself.
    fn validate(&self, ctx: &mut ValidationContext) -> Result<bool, HandlerError>;
}

impl<F> PasswordHandler for (&'static str, F)
where
    F: Fn(&mut ValidationContext) -> Result<bool, HandlerError> + Send + Sync,
{
    fn id(&self) -> &'static str {
        self.0
    }

    fn validate(&self, ctx: &mut ValidationContext) -> Result<bool, HandlerError> {
        (self.1)(ctx)
    }
}

//! Chain Runner: executes handlers in order and stops at the first denial
use crate::context::{ValidationContext, ValidationRequest};
use crate::handler::PasswordHandler;
use crate::outcome::{ValidationCode, ValidationOutcome};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error};

pub struct ValidationChain {
    handlers: Vec<Box<dyn PasswordHandler>>,
    chain_id: String,
}

impl ValidationChain {
    pub fn new(handlers: Vec<Box<dyn PasswordHandler>>) -> Self {
        let chain_id = handlers
            .iter()
            .map(|h| h.id())
            .collect::<Vec<_>>()
            .join("→");

        Self { handlers, chain_id }
    }

    /// Validate a caller request
    pub fn run(&self, request: ValidationRequest) -> ValidationOutcome {
        self.run_context(request.into_context())
    }

    /// Validate with an already-seeded context
    pub fn run_context(&self, mut ctx: ValidationContext) -> ValidationOutcome {
        let start = Instant::now();

        for handler in &self.handlers {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler.validate(&mut ctx)));

            match result {
                Ok(Ok(true)) => continue,
                Ok(Ok(false)) => {
                    let code = ctx
                        .error_code
                        .unwrap_or(ValidationCode::InternalValidationError);
                    debug!(
                        trace_id = %ctx.trace_id,
                        handler = handler.id(),
                        code = code.as_str(),
                        latency_ms = start.elapsed().as_millis() as u64,
                        "password denied"
                    );
                    return ValidationOutcome::deny(code);
                }
                Ok(Err(e)) => {
                    error!(
                        trace_id = %ctx.trace_id,
                        handler = handler.id(),
                        error = %e,
                        "handler failed, denying password"
                    );
                    return ValidationOutcome::deny(ValidationCode::InternalValidationError);
                }
                Err(_) => {
                    error!(
                        trace_id = %ctx.trace_id,
                        handler = handler.id(),
                        "handler panicked, denying password"
                    );
                    return ValidationOutcome::deny(ValidationCode::InternalValidationError);
                }
            }
        }

        debug!(
            trace_id = %ctx.trace_id,
            chain = %self.chain_id,
            latency_ms = start.elapsed().as_millis() as u64,
            "password allowed"
        );
        ValidationOutcome::allow()
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Handler ids in execution order
    pub fn handler_ids(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

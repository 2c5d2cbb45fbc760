//! pwgate Core: Handler Trait, Chain Runner, and Policy Data Model
//!
//! Generic password validation chain with a single handler contract, plus the
//! policy record model shared by the store and the patch engine.

pub mod config;
pub mod context;
pub mod data_model;
pub mod error;
pub mod handler;
pub mod outcome;
pub mod runner;

pub use config::PasswordConfig;
pub use context::{ValidationContext, ValidationRequest};
pub use data_model::{keys, PolicyRecord, RuleValue, ValidationRules};
pub use error::{ConfigError, HandlerError, PolicyError, StoreError, StructuralViolation};
pub use handler::PasswordHandler;
pub use outcome::{ValidationCode, ValidationOutcome};
pub use runner::ValidationChain;

/// Engine version
pub const PWGATE_VERSION: &str = "1.0.0";

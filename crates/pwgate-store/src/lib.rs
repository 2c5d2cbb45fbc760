//! pwgate Store: persistence contract, in-memory store, and stock policies
pub mod defaults;
pub mod service;
pub mod store;

pub use defaults::default_policies;
pub use service::PolicyService;
pub use store::{InMemoryPolicyStore, PolicyRow, PolicyStore};

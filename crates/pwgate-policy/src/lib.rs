//! pwgate Policy: patch grouping, application, and structural validation
//!
//! Administrative updates arrive as one flat JSON Patch covering any number of
//! policies. The engine splits it per policy key and commits all of it or none.
//!
//! # Architecture
//!
//! ```text
//! Patch → Replace Gate → Group by Key → Load All → Apply per Group → Structural Check → Save All
//!              ↓               ↓             ↓              ↓                  ↓
//!       INVALID_PATCH   INVALID_PATCH   STORE_ERROR   DOES_NOT_EXIST /   STRUCTURAL_VIOLATION
//!                                                     INVALID_PATCH
//! ```
//!
//! # Example
//!
//! ```
//! use pwgate_policy::PatchEngine;
//! use pwgate_store::{default_policies, InMemoryPolicyStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = InMemoryPolicyStore::with_records(default_policies()).unwrap();
//! let engine = PatchEngine::new(Arc::new(store));
//!
//! let updated = engine
//!     .apply_document(
//!         &json!([{ "op": "replace", "path": "/size/0/minLength", "value": 10 }]),
//!         "admin",
//!     )
//!     .unwrap();
//!
//! assert_eq!(updated[0].rules().get_int("minLength"), Some(10));
//! ```

pub mod engine;
pub mod patch;
pub mod pointer;
pub mod structural;

pub use engine::{PatchEngine, PolicyChange};
pub use patch::{
    ensure_replace_only, group_operations, parse_patch, split_path, PatchGroups, PatchOperation,
    DEFAULT_PREFIX_SEGMENTS,
};
pub use pointer::apply_to_record;
pub use structural::{validate_update, MIN_ALLOWED_LENGTH};

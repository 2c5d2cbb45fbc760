//! Patch Engine: groups a flat patch by policy key, applies each group to its
//! record, validates the result, and commits everything in one save.
use crate::patch::{
    ensure_replace_only, group_operations, parse_patch, PatchGroups, PatchOperation,
    DEFAULT_PREFIX_SEGMENTS,
};
use crate::pointer::apply_to_record;
use crate::structural::validate_update;
use chrono::Utc;
use pwgate_core::{PolicyError, PolicyRecord};
use pwgate_store::{PolicyService, PolicyStore};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// A planned change to one policy record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyChange {
    pub original: PolicyRecord,
    pub updated: PolicyRecord,
}

pub struct PatchEngine {
    policies: PolicyService,
    prefix_segments: usize,
}

impl PatchEngine {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self {
            policies: PolicyService::new(store),
            prefix_segments: DEFAULT_PREFIX_SEGMENTS,
        }
    }

    /// Number of leading path segments (key included) stripped before applying.
    /// The key is always stripped, so values below 1 are raised to 1.
    pub fn with_prefix_segments(mut self, segments: usize) -> Self {
        self.prefix_segments = segments.max(1);
        self
    }

    pub fn prefix_segments(&self) -> usize {
        self.prefix_segments
    }

    /// Gate on `replace`, then group by policy key
    pub fn group(&self, operations: &[PatchOperation]) -> Result<PatchGroups, PolicyError> {
        ensure_replace_only(operations)?;
        group_operations(operations, self.prefix_segments)
    }

    /// Compute every change without writing anything
    pub fn plan(&self, operations: &[PatchOperation]) -> Result<Vec<PolicyChange>, PolicyError> {
        let groups = self.group(operations)?;
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let index = self.policies.index()?;
        let mut changes = Vec::with_capacity(groups.len());

        for (key, sub_patch) in &groups {
            let original = index
                .get(key)
                .ok_or_else(|| PolicyError::PolicyNotFound(key.clone()))?;

            let updated = apply_to_record(original, sub_patch)?;
            validate_update(original, &updated)?;

            debug!(policy = %key, operations = sub_patch.len(), "policy patch planned");
            changes.push(PolicyChange {
                original: original.clone(),
                updated,
            });
        }

        Ok(changes)
    }

    /// Apply a patch batch atomically and return the updated records
    pub fn apply(
        &self,
        operations: &[PatchOperation],
        actor: &str,
    ) -> Result<Vec<PolicyRecord>, PolicyError> {
        let changes = self.plan(operations)?;
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let updated: Vec<PolicyRecord> = changes
            .into_iter()
            .map(|change| {
                let mut record = change.updated;
                record.touch(actor, now);
                record
            })
            .collect();

        let keys: Vec<String> = updated.iter().map(|r| r.key.clone()).collect();
        info!(actor, policies = ?keys, "committing policy patch");

        let saved = self.policies.save_all(updated)?;
        let saved_keys: Vec<&str> = saved.iter().map(|r| r.key.as_str()).collect();
        if saved_keys != keys {
            return Err(PolicyError::Internal(format!(
                "store committed {:?}, expected {:?}",
                saved_keys, keys
            )));
        }
        Ok(saved)
    }

    /// Parse a raw JSON Patch document and apply it
    pub fn apply_document(&self, document: &Value, actor: &str) -> Result<Vec<PolicyRecord>, PolicyError> {
        let operations = parse_patch(document)?;
        self.apply(&operations, actor)
    }

    /// Parse a raw JSON Patch document and plan it
    pub fn plan_document(&self, document: &Value) -> Result<Vec<PolicyChange>, PolicyError> {
        let operations = parse_patch(document)?;
        self.plan(&operations)
    }

    pub fn policies(&self) -> &PolicyService {
        &self.policies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwgate_store::{default_policies, InMemoryPolicyStore};
    use serde_json::json;

    fn engine() -> PatchEngine {
        let store = InMemoryPolicyStore::with_records(default_policies()).unwrap();
        PatchEngine::new(Arc::new(store))
    }

    #[test]
    fn test_apply_stamps_audit_fields() {
        let engine = engine();
        let updated = engine
            .apply(&[PatchOperation::replace("/size/0/minLength", json!(10))], "admin")
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].updated_by.as_deref(), Some("admin"));
        assert!(updated[0].update_date.is_some());

        let stored = engine.policies().get("size").unwrap();
        assert_eq!(stored.rules().get_int("minLength"), Some(10));
        assert_eq!(stored.updated_by.as_deref(), Some("admin"));
    }

    #[test]
    fn test_plan_writes_nothing() {
        let engine = engine();
        let changes = engine
            .plan(&[PatchOperation::replace("/size/0/minLength", json!(12))])
            .unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].original.rules().get_int("minLength"), Some(8));
        assert_eq!(changes[0].updated.rules().get_int("minLength"), Some(12));
        assert_eq!(engine.policies().get("size").unwrap().rules().get_int("minLength"), Some(8));
    }

    #[test]
    fn test_empty_patch_is_noop() {
        assert!(engine().apply(&[], "admin").unwrap().is_empty());
    }

    #[test]
    fn test_prefix_segments_floor() {
        let engine = engine().with_prefix_segments(0);
        assert_eq!(engine.prefix_segments(), 1);

        let updated = engine
            .apply(&[PatchOperation::replace("/size/maxLength", json!(40))], "admin")
            .unwrap();
        assert_eq!(updated[0].rules().get_int("maxLength"), Some(40));
    }
}

//! Integration tests for the patch engine

use pwgate_core::{PolicyError, PolicyRecord, StoreError};
use pwgate_policy::{PatchEngine, PatchOperation};
use pwgate_store::{default_policies, InMemoryPolicyStore, PolicyStore};
use serde_json::json;
use std::sync::Arc;

fn seeded() -> (Arc<InMemoryPolicyStore>, PatchEngine) {
    let store = Arc::new(InMemoryPolicyStore::with_records(default_policies()).unwrap());
    let engine = PatchEngine::new(store.clone());
    (store, engine)
}

fn rule_int(store: &InMemoryPolicyStore, key: &str, rule: &str) -> Option<i64> {
    store.find_by_key(key).unwrap().unwrap().rules().get_int(rule)
}

fn rule_str(store: &InMemoryPolicyStore, key: &str, rule: &str) -> Option<String> {
    store
        .find_by_key(key)
        .unwrap()
        .unwrap()
        .rules()
        .get_str(rule)
        .map(str::to_string)
}

#[test]
fn test_multi_policy_patch() {
    let (store, engine) = seeded();

    let updated = engine
        .apply_document(
            &json!([
                { "op": "replace", "path": "/size/0/minLength", "value": 10 },
                { "op": "replace", "path": "/specialChars/0/allowedSpecialChars", "value": "!@#" }
            ]),
            "admin",
        )
        .unwrap();

    let keys: Vec<_> = updated.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["size", "specialChars"]);
    assert_eq!(rule_int(&store, "size", "minLength"), Some(10));
    assert_eq!(rule_str(&store, "specialChars", "allowedSpecialChars").as_deref(), Some("!@#"));
}

#[test]
fn test_size_rules() {
    for (min, max, ok) in [(6, 10, false), (10, 9, false), (10, 10, false), (10, 20, true)] {
        let (store, engine) = seeded();
        let result = engine.apply(
            &[
                PatchOperation::replace("/size/0/minLength", json!(min)),
                PatchOperation::replace("/size/0/maxLength", json!(max)),
            ],
            "admin",
        );

        if ok {
            assert!(result.is_ok(), "{}/{}", min, max);
            assert_eq!(rule_int(&store, "size", "minLength"), Some(min));
            assert_eq!(rule_int(&store, "size", "maxLength"), Some(max));
        } else {
            let err = result.unwrap_err();
            assert_eq!(err.code(), "POLICY_STRUCTURAL_VIOLATION", "{}/{}", min, max);
            assert_eq!(rule_int(&store, "size", "minLength"), Some(8));
            assert_eq!(rule_int(&store, "size", "maxLength"), Some(64));
        }
    }
}

#[test]
fn test_batch_is_atomic() {
    let (store, engine) = seeded();
    let before = store.find_all().unwrap();

    let err = engine
        .apply(
            &[
                PatchOperation::replace("/size/0/minLength", json!(10)),
                PatchOperation::replace("/specialChars/0/excludedSpecialChars", json!("!$")),
            ],
            "admin",
        )
        .unwrap_err();

    match err {
        PolicyError::StructuralViolation(v) => assert_eq!(v.key, "specialChars"),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(store.find_all().unwrap(), before);
}

#[test]
fn test_non_replace_rejected_before_lookup() {
    let (store, engine) = seeded();
    let before = store.find_all().unwrap();

    for op in ["add", "remove", "move", "copy", "test"] {
        let err = engine
            .apply_document(
                &json!([
                    { "op": "replace", "path": "/size/0/minLength", "value": 10 },
                    { "op": op, "path": "/noSuchPolicy/0/x", "from": "/size/0/maxLength", "value": 1 }
                ]),
                "admin",
            )
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_PATCH_OPERATION", "{}", op);
    }
    assert_eq!(store.find_all().unwrap(), before);
}

#[test]
fn test_unknown_policy_key() {
    let (store, engine) = seeded();

    let err = engine
        .apply(
            &[
                PatchOperation::replace("/size/0/minLength", json!(10)),
                PatchOperation::replace("/entropy/0/minBits", json!(40)),
            ],
            "admin",
        )
        .unwrap_err();

    assert!(matches!(err, PolicyError::PolicyNotFound(ref k) if k == "entropy"));
    assert_eq!(rule_int(&store, "size", "minLength"), Some(8));
}

#[test]
fn test_reapplying_is_idempotent() {
    let (store, engine) = seeded();
    let patch = [PatchOperation::replace("/size/0/maxLength", json!(32))];

    engine.apply(&patch, "admin").unwrap();
    let first = store.find_by_key("size").unwrap().unwrap();
    engine.apply(&patch, "admin").unwrap();
    let second = store.find_by_key("size").unwrap().unwrap();

    assert_eq!(first.validation_rules, second.validation_rules);
    assert_eq!(first.required, second.required);
    assert_eq!(first.create_date, second.create_date);
}

#[test]
fn test_disabled_policy_stays_locked() {
    let (store, engine) = seeded();

    engine
        .apply(&[PatchOperation::replace("/size/0/required", json!(false))], "admin")
        .unwrap();
    assert!(!store.find_by_key("size").unwrap().unwrap().required);

    let err = engine
        .apply(&[PatchOperation::replace("/size/0/minLength", json!(12))], "admin")
        .unwrap_err();
    assert_eq!(err.code(), "POLICY_STRUCTURAL_VIOLATION");
    assert!(err.to_string().contains("Cannot update a disabled password policy"));

    // Re-enabling in the same batch is allowed
    engine
        .apply(
            &[
                PatchOperation::replace("/size/0/required", json!(true)),
                PatchOperation::replace("/size/0/minLength", json!(12)),
            ],
            "admin",
        )
        .unwrap();
    assert_eq!(rule_int(&store, "size", "minLength"), Some(12));
}

#[test]
fn test_audit_fields_immutable_through_patch() {
    let (_, engine) = seeded();
    let err = engine
        .apply(&[PatchOperation::replace("/size/0/createdBy", json!("mallory"))], "admin")
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_PATCH_OPERATION");
}

#[test]
fn test_plan_document_is_dry_run() {
    let (store, engine) = seeded();
    let changes = engine
        .plan_document(&json!([
            { "op": "replace", "path": "/usernameSequenceExclusion/0/maxConsecutiveLetters", "value": 4 }
        ]))
        .unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].updated.rules().get_int("maxConsecutiveLetters"), Some(4));
    assert_eq!(rule_int(&store, "usernameSequenceExclusion", "maxConsecutiveLetters"), Some(3));
}

struct ReadOnlyStore(InMemoryPolicyStore);

impl PolicyStore for ReadOnlyStore {
    fn find_all(&self) -> Result<Vec<PolicyRecord>, StoreError> {
        self.0.find_all()
    }

    fn find_by_key(&self, key: &str) -> Result<Option<PolicyRecord>, StoreError> {
        self.0.find_by_key(key)
    }

    fn save_all(&self, _records: Vec<PolicyRecord>) -> Result<Vec<PolicyRecord>, StoreError> {
        Err(StoreError::Poisoned("read only".to_string()))
    }
}

#[test]
fn test_store_failure_surfaces() {
    let inner = InMemoryPolicyStore::with_records(default_policies()).unwrap();
    let engine = PatchEngine::new(Arc::new(ReadOnlyStore(inner)));

    let err = engine
        .apply(&[PatchOperation::replace("/size/0/minLength", json!(10))], "admin")
        .unwrap_err();
    assert_eq!(err.code(), "POLICY_STORE_ERROR");
    assert!(!err.is_client_error());
}

struct ForgetfulStore(InMemoryPolicyStore);

impl PolicyStore for ForgetfulStore {
    fn find_all(&self) -> Result<Vec<PolicyRecord>, StoreError> {
        self.0.find_all()
    }

    fn find_by_key(&self, key: &str) -> Result<Option<PolicyRecord>, StoreError> {
        self.0.find_by_key(key)
    }

    fn save_all(&self, _records: Vec<PolicyRecord>) -> Result<Vec<PolicyRecord>, StoreError> {
        Ok(Vec::new())
    }
}

#[test]
fn test_incomplete_commit_is_internal_error() {
    let inner = InMemoryPolicyStore::with_records(default_policies()).unwrap();
    let engine = PatchEngine::new(Arc::new(ForgetfulStore(inner)));

    let err = engine
        .apply(&[PatchOperation::replace("/size/0/minLength", json!(10))], "admin")
        .unwrap_err();
    assert!(matches!(err, PolicyError::Internal(_)));
    assert_eq!(err.code(), "INTERNAL_ERROR");
    assert!(!err.is_client_error());
}

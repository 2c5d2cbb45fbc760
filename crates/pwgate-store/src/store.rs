//! Policy Store: persistence contract and the in-memory implementation
use chrono::{DateTime, Utc};
use pwgate_core::{PolicyRecord, StoreError, ValidationRules};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;
use tracing::debug;

/// Load-by-key / save-all persistence for policy records.
///
/// `save_all` must be atomic: either every record is written or none is.
pub trait PolicyStore: Send + Sync {
    fn find_all(&self) -> Result<Vec<PolicyRecord>, StoreError>;

    fn find_by_key(&self, key: &str) -> Result<Option<PolicyRecord>, StoreError>;

    fn save_all(&self, records: Vec<PolicyRecord>) -> Result<Vec<PolicyRecord>, StoreError>;
}

/// Row shape at the persistence boundary: rules kept as serialized JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRow {
    pub key: String,
    pub name: String,
    pub description: String,
    pub validation_rules: Option<String>,
    pub priority: i32,
    pub required: bool,
    pub created_by: String,
    pub create_date: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub update_date: Option<DateTime<Utc>>,
}

impl PolicyRow {
    pub fn encode(record: &PolicyRecord) -> Result<Self, StoreError> {
        let validation_rules = record
            .validation_rules
            .as_ref()
            .map(ValidationRules::to_json_string)
            .transpose()
            .map_err(|e| StoreError::Codec(format!("{}: {}", record.key, e)))?;

        Ok(Self {
            key: record.key.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            validation_rules,
            priority: record.priority,
            required: record.required,
            created_by: record.created_by.clone(),
            create_date: record.create_date,
            updated_by: record.updated_by.clone(),
            update_date: record.update_date,
        })
    }

    pub fn decode(&self) -> Result<PolicyRecord, StoreError> {
        let validation_rules = self
            .validation_rules
            .as_deref()
            .map(ValidationRules::from_json_str)
            .transpose()
            .map_err(|e| StoreError::Codec(format!("{}: {}", self.key, e)))?;

        Ok(PolicyRecord {
            key: self.key.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            validation_rules,
            priority: self.priority,
            required: self.required,
            created_by: self.created_by.clone(),
            create_date: self.create_date,
            updated_by: self.updated_by.clone(),
            update_date: self.update_date,
        })
    }
}

/// Process-local store; rows are keyed and ordered by policy key
#[derive(Default)]
pub struct InMemoryPolicyStore {
    rows: RwLock<BTreeMap<String, PolicyRow>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `records`
    pub fn with_records(records: Vec<PolicyRecord>) -> Result<Self, StoreError> {
        let store = Self::new();
        store.save_all(records)?;
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write a raw row, bypassing the codec (for rows produced elsewhere)
    pub fn insert_row(&self, row: PolicyRow) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        rows.insert(row.key.clone(), row);
        Ok(())
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn find_all(&self) -> Result<Vec<PolicyRecord>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        rows.values().map(PolicyRow::decode).collect()
    }

    fn find_by_key(&self, key: &str) -> Result<Option<PolicyRecord>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        rows.get(key).map(PolicyRow::decode).transpose()
    }

    fn save_all(&self, records: Vec<PolicyRecord>) -> Result<Vec<PolicyRecord>, StoreError> {
        // Encode everything before taking the lock so a bad record writes nothing
        let mut seen = BTreeSet::new();
        let mut encoded = Vec::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.key.clone()) {
                return Err(StoreError::DuplicateKey(record.key.clone()));
            }
            encoded.push(PolicyRow::encode(record)?);
        }

        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        for row in encoded {
            rows.insert(row.key.clone(), row);
        }
        debug!(count = records.len(), "policy records saved");

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwgate_core::keys;

    fn size_record(min: i64, max: i64) -> PolicyRecord {
        PolicyRecord::new(keys::SIZE, "Password size")
            .with_rules(ValidationRules::new().with("minLength", min).with("maxLength", max))
    }

    #[test]
    fn test_save_and_find() {
        let store = InMemoryPolicyStore::new();
        store.save_all(vec![size_record(8, 64)]).unwrap();

        let found = store.find_by_key(keys::SIZE).unwrap().unwrap();
        assert_eq!(found.rules().get_int("minLength"), Some(8));
        assert!(store.find_by_key("missing").unwrap().is_none());
        assert_eq!(store.find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_rows_hold_serialized_rules() {
        let record = size_record(10, 20);
        let row = PolicyRow::encode(&record).unwrap();
        assert_eq!(row.validation_rules.as_deref(), Some(r#"{"maxLength":20,"minLength":10}"#));
        assert_eq!(row.decode().unwrap(), record);
    }

    #[test]
    fn test_save_all_overwrites_by_key() {
        let store = InMemoryPolicyStore::with_records(vec![size_record(8, 64)]).unwrap();
        store.save_all(vec![size_record(10, 20)]).unwrap();

        let found = store.find_by_key(keys::SIZE).unwrap().unwrap();
        assert_eq!(found.rules().get_int("minLength"), Some(10));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_keys_write_nothing() {
        let store = InMemoryPolicyStore::with_records(vec![size_record(8, 64)]).unwrap();
        let err = store
            .save_all(vec![size_record(10, 20), size_record(12, 24)])
            .unwrap_err();

        assert_eq!(err, StoreError::DuplicateKey(keys::SIZE.to_string()));
        let found = store.find_by_key(keys::SIZE).unwrap().unwrap();
        assert_eq!(found.rules().get_int("minLength"), Some(8));
    }

    #[test]
    fn test_corrupt_row_is_codec_error() {
        let store = InMemoryPolicyStore::new();
        let mut row = PolicyRow::encode(&size_record(8, 64)).unwrap();
        row.validation_rules = Some("{not json".to_string());
        store.insert_row(row).unwrap();

        assert!(matches!(store.find_by_key(keys::SIZE), Err(StoreError::Codec(_))));
        assert!(matches!(store.find_all(), Err(StoreError::Codec(_))));
    }

    #[test]
    fn test_null_rules_round_trip_as_none() {
        let mut record = size_record(8, 64);
        record.validation_rules = None;
        let row = PolicyRow::encode(&record).unwrap();
        assert!(row.validation_rules.is_none());
        assert!(row.decode().unwrap().validation_rules.is_none());
    }
}

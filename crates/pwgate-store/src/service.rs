//! Policy Store Accessor
use crate::store::PolicyStore;
use pwgate_core::{PolicyError, PolicyRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// Thin accessor over a [`PolicyStore`] that speaks [`PolicyError`]
#[derive(Clone)]
pub struct PolicyService {
    store: Arc<dyn PolicyStore>,
}

impl PolicyService {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Result<Vec<PolicyRecord>, PolicyError> {
        Ok(self.store.find_all()?)
    }

    /// All records indexed by key
    pub fn index(&self) -> Result<HashMap<String, PolicyRecord>, PolicyError> {
        Ok(self
            .list()?
            .into_iter()
            .map(|record| (record.key.clone(), record))
            .collect())
    }

    pub fn get(&self, key: &str) -> Result<PolicyRecord, PolicyError> {
        self.store
            .find_by_key(key)?
            .ok_or_else(|| PolicyError::PolicyNotFound(key.to_string()))
    }

    pub fn save_all(&self, records: Vec<PolicyRecord>) -> Result<Vec<PolicyRecord>, PolicyError> {
        Ok(self.store.save_all(records)?)
    }

    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }
}

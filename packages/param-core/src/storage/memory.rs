//! In-memory store, used by tests and short-lived sessions.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as Json;

use super::KeyValueStore;
use crate::error::{ParamError, Result};

/// Key-value store held in a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Json>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored keys.
    pub fn keys(&self) -> Vec<String> {
        self.values
            .read()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Json>> {
        let values = self.values.read().map_err(|_| ParamError::LockPoisoned)?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: Json) -> Result<()> {
        let mut values = self.values.write().map_err(|_| ParamError::LockPoisoned)?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| ParamError::LockPoisoned)?;
        values.remove(key);
        Ok(())
    }
}

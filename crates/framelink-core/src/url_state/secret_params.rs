//! One-time transfer of a sensitive query parameter into session storage.
//!
//! A secret such as an admin token arrives once in the query string. The first
//! read copies it into the session store and strips it from the visible URL;
//! later reads are served from the store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::{ParamBag, UrlCell};
use crate::error::StoreError;

/// Session-scoped key/value storage.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Session store living for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .lock()
            .map_err(|_| StoreError("session store lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StoreError("session store lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone)]
pub struct SecretParams {
    cell: Arc<dyn UrlCell>,
    store: Arc<dyn SessionStore>,
}

impl SecretParams {
    pub fn new(cell: Arc<dyn UrlCell>, store: Arc<dyn SessionStore>) -> Self {
        Self { cell, store }
    }

    /// Look up `key` in the session store, then in the query string.
    ///
    /// A value found in the query string is persisted before it is returned
    /// and only then removed from the URL (path and fragment kept). If the
    /// store cannot be written the value is still returned but the URL is
    /// left as it is.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(Some(stored)) if !stored.is_empty() => return Some(stored),
            Ok(_) => {}
            Err(e) => warn!(key, error = %e, "Session storage not available"),
        }

        let mut location = self.cell.location();
        let mut query = ParamBag::parse(location.query_str());
        let value = query
            .get(key)
            .filter(|value| !value.is_empty())?
            .to_string();

        if let Err(e) = self.store.set(key, &value) {
            warn!(key, error = %e, "Failed to store secret parameter in session storage");
            return Some(value);
        }

        query.remove(key);
        location.query = if query.is_empty() {
            None
        } else {
            Some(query.serialize())
        };
        self.cell.replace(location);
        debug!(key, "Moved secret parameter from URL to session storage");

        Some(value)
    }
}

//! A JSON map that can also be read and written by field name.
//!
//! Keyed access through [`DotDict::get`] returns an `Option`; named access
//! through [`DotDict::attr`] treats a missing key as an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DotDictError {
    #[error("attribute {0} not found")]
    NotFound(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct DotDict {
    entries: Map<String, Value>,
}

impl DotDict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Keyed access, a missing key is None; only named access fails
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Named access
    ///
    /// # Errors
    ///
    /// Returns [`DotDictError::NotFound`] if `name` is absent.
    pub fn attr(&self, name: &str) -> Result<&Value, DotDictError> {
        self.entries
            .get(name)
            .ok_or_else(|| DotDictError::NotFound(name.to_string()))
    }

    // Named assignment always succeeds, inserting or overwriting
    pub fn set_attr(&mut self, name: &str, value: impl Into<Value>) {
        self.entries.insert(name.to_string(), value.into());
    }

    /// Named deletion
    ///
    /// # Errors
    ///
    /// Returns [`DotDictError::NotFound`] if `name` is absent.
    pub fn del_attr(&mut self, name: &str) -> Result<Value, DotDictError> {
        self.entries
            .remove(name)
            .ok_or_else(|| DotDictError::NotFound(name.to_string()))
    }
}

impl From<Map<String, Value>> for DotDict {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

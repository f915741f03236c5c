//! Per-satellite startup parameters
//!
//! Last write wins. A satellite reads its parameters during registration and
//! they stay in place afterwards, so a reloaded satellite sees the same
//! values until the next open supplies new ones.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ParameterStore {
    params: HashMap<String, Value>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record parameters for `name`, returning the value it replaced
    pub fn set(&mut self, name: &str, params: Value) -> Option<Value> {
        let previous = self.params.insert(name.to_string(), params);
        if previous.is_some() {
            debug!(%name, "ParameterStore::set: replaced previous params");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_write_wins() {
        let mut store = ParameterStore::new();
        assert!(store.set("viewer", json!({"file": "a.R"})).is_none());
        let previous = store.set("viewer", json!({"file": "b.R"}));

        assert_eq!(previous, Some(json!({"file": "a.R"})));
        assert_eq!(store.get("viewer"), Some(&json!({"file": "b.R"})));
    }

    #[test]
    fn test_get_does_not_consume() {
        let mut store = ParameterStore::new();
        store.set("viewer", json!(1));

        assert!(store.get("viewer").is_some());
        assert!(store.get("viewer").is_some());
        assert_eq!(store.len(), 1);
    }
}

use indexmap::IndexMap;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Per-call scratch space attached to a request or a response.
///
/// Clones share the same underlying map, so a handler writing to the state it
/// was given is visible to everything else holding that request or response.
#[derive(Debug, Clone, Default)]
pub struct State {
    inner: Arc<Mutex<IndexMap<String, Value>>>,
}

impl State {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(map: IndexMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(map)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, Value>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.lock().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().shift_remove(key)
    }

    #[must_use]
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.lock().clone()
    }

    /// The whole state as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// True when both handles point at the same map.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other) || self.snapshot() == other.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clones_share_storage() {
        let state = State::new();
        let handle = state.clone();
        handle.set("token", json!("abc"));
        assert_eq!(state.get("token"), Some(json!("abc")));
        assert!(state.same_as(&handle));
    }

    #[test]
    fn test_from_map_is_independent_copy() {
        let mut map = IndexMap::new();
        map.insert("attempt".to_string(), json!(1));
        let state = State::from_map(map.clone());
        state.set("attempt", json!(2));
        assert_eq!(map["attempt"], json!(1));
        assert_eq!(state.to_value(), json!({"attempt": 2}));
    }
}

//! Shared key-value property state.
//!
//! Host windows expose string properties to their skins. Background work
//! (expiry timers, polling) must not touch the UI directly, so it writes into a
//! [`PropertyStore`] and the UI thread reads the store on its next pump.
//!
//! # Example
//!
//! ```
//! use horizon_listsync_core::PropertyStore;
//!
//! let store = PropertyStore::new();
//! assert!(store.set("busy", "1"));
//! assert!(!store.set("busy", "1"));
//! assert_eq!(store.get("busy"), "1");
//! assert_eq!(store.get("missing"), "");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logging::targets;
use crate::signal::Signal;

struct StoreInner {
    values: RwLock<HashMap<String, String>>,
    changed: Signal<(String, String)>,
}

/// A cloneable handle to shared string properties.
///
/// Missing keys read as the empty string, matching how host toolkits report
/// unset window properties. Clones share the same underlying map.
#[derive(Clone)]
pub struct PropertyStore {
    inner: Arc<StoreInner>,
}

impl Default for PropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                values: RwLock::new(HashMap::new()),
                changed: Signal::new(),
            }),
        }
    }

    /// Get a property value, or `""` if unset.
    pub fn get(&self, key: &str) -> String {
        self.inner
            .values
            .read()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns `true` if the key has been set (even to `""`).
    pub fn contains(&self, key: &str) -> bool {
        self.inner.values.read().contains_key(key)
    }

    /// Set a property value, returning `true` if the value changed.
    ///
    /// Emits [`changed`](Self::changed) after the write lock is released.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        {
            let mut values = self.inner.values.write();
            if values.get(&key) == Some(&value) {
                return false;
            }
            values.insert(key.clone(), value.clone());
        }
        tracing::trace!(target: targets::PROPERTY, %key, %value, "property set");
        self.inner.changed.emit((key, value));
        true
    }

    /// Set a boolean property using the `"1"` / `""` convention.
    pub fn set_bool(&self, key: impl Into<String>, value: bool) -> bool {
        self.set(key, if value { "1" } else { "" })
    }

    /// Remove a property, returning its previous value.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.inner.values.write().remove(key)
    }

    /// Copy of every property currently set.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner.values.read().clone()
    }

    /// Signal emitted with `(key, value)` after a property changes.
    pub fn changed(&self) -> &Signal<(String, String)> {
        &self.inner.changed
    }
}

static_assertions::assert_impl_all!(PropertyStore: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_set_reports_change() {
        let store = PropertyStore::new();
        assert!(store.set("a", "1"));
        assert!(!store.set("a", "1"));
        assert!(store.set("a", "2"));
        assert_eq!(store.get("a"), "2");
    }

    #[test]
    fn test_bool_convention() {
        let store = PropertyStore::new();
        store.set_bool("flag", true);
        assert_eq!(store.get("flag"), "1");
        store.set_bool("flag", false);
        assert_eq!(store.get("flag"), "");
        assert!(store.contains("flag"));
    }

    #[test]
    fn test_clones_share_state_across_threads() {
        let store = PropertyStore::new();
        let writer = store.clone();
        std::thread::spawn(move || {
            writer.set("from_thread", "yes");
        })
        .join()
        .unwrap();
        assert_eq!(store.get("from_thread"), "yes");
    }

    #[test]
    fn test_changed_signal() {
        let store = PropertyStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        store.changed().connect(move |(k, v)| {
            seen_clone.lock().push(format!("{k}={v}"));
        });

        store.set("x", "1");
        store.set("x", "1");
        store.set("y", "2");

        assert_eq!(*seen.lock(), vec!["x=1".to_string(), "y=2".to_string()]);
    }

    #[test]
    fn test_remove() {
        let store = PropertyStore::new();
        store.set("k", "v");
        assert_eq!(store.remove("k"), Some("v".to_string()));
        assert_eq!(store.get("k"), "");
        assert_eq!(store.remove("k"), None);
    }
}

//! Scoped property overrides.
//!
//! A scope writes a value when created and restores the previous value when
//! dropped, including on early return and unwinding.
//!
//! ```
//! use horizon_listsync::window::PropertyScope;
//! use horizon_listsync_core::PropertyStore;
//!
//! let props = PropertyStore::new();
//! props.set("busy", "0");
//! {
//!     let _busy = PropertyScope::new(&props, "busy", "1");
//!     assert_eq!(props.get("busy"), "1");
//! }
//! assert_eq!(props.get("busy"), "0");
//! ```

use horizon_listsync_core::PropertyStore;
use horizon_listsync_core::logging::targets;

use super::context::WindowContext;
use super::host::PropertyTarget;

/// Overrides one property of a window for the lifetime of the guard.
#[must_use = "the property is restored as soon as the scope is dropped"]
pub struct PropertyScope<'a> {
    target: &'a dyn PropertyTarget,
    key: String,
    previous: String,
    end: String,
}

impl<'a> PropertyScope<'a> {
    /// Set `key` to `value`, restoring the current value on drop.
    pub fn new(target: &'a dyn PropertyTarget, key: &str, value: &str) -> Self {
        Self::with_end(target, key, value, "")
    }

    /// Set `key` to `value`, writing `end` on drop instead of the previous
    /// value. An empty `end` restores the previous value.
    pub fn with_end(target: &'a dyn PropertyTarget, key: &str, value: &str, end: &str) -> Self {
        let previous = target.property(key);
        if let Err(error) = target.set_property(key, value) {
            tracing::warn!(target: targets::WINDOW, key, %error, "failed to set scoped property");
        }
        Self {
            target,
            key: key.to_string(),
            previous,
            end: end.to_string(),
        }
    }

    /// The overridden key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value seen before the override.
    pub fn previous(&self) -> &str {
        &self.previous
    }
}

impl Drop for PropertyScope<'_> {
    fn drop(&mut self) {
        let restore = if self.end.is_empty() { &self.previous } else { &self.end };
        if let Err(error) = self.target.set_property(&self.key, restore) {
            tracing::warn!(target: targets::WINDOW, key = %self.key, %error, "failed to restore scoped property");
        }
    }
}

/// Overrides one namespaced global property for the lifetime of the guard.
#[must_use = "the property is restored as soon as the scope is dropped"]
pub struct GlobalPropertyScope {
    store: PropertyStore,
    key: String,
    previous: String,
    end: String,
}

impl GlobalPropertyScope {
    /// Set the global `property` to `value`, restoring it on drop.
    pub fn new(context: &WindowContext, property: &str, value: &str) -> Self {
        Self::with_end(context, property, value, "")
    }

    /// Set the global `property` to `value`, writing `end` on drop. An empty
    /// `end` restores the previous value.
    pub fn with_end(context: &WindowContext, property: &str, value: &str, end: &str) -> Self {
        let store = context.global_properties().clone();
        let key = context.global_key(property);
        let previous = store.get(&key);
        store.set(key.as_str(), value);
        Self {
            store,
            key,
            previous,
            end: end.to_string(),
        }
    }

    /// The namespaced key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value seen before the override.
    pub fn previous(&self) -> &str {
        &self.previous
    }
}

impl Drop for GlobalPropertyScope {
    fn drop(&mut self) {
        let restore = if self.end.is_empty() { &self.previous } else { &self.end };
        self.store.set(self.key.as_str(), restore.as_str());
    }
}

//! Synchronization registry: parameter id → update callback.
//!
//! Every bound control registers a callback under its parameter id when it is
//! built. When the server sends an `update` message, the session looks each id up
//! here and hands the new value to the matching callback, which refreshes the
//! control's displayed value without sending anything back.
//!
//! Entries live exactly as long as the [`Registration`] guard returned by
//! [`SyncRegistry::register`]; dropping the control drops the guard and removes
//! the entry. Ids are expected to be unique within one interface. On collision
//! the latest registration wins, and dropping the superseded guard leaves the
//! newer entry in place.
//!
//! The registry is single-threaded (`Rc`/`RefCell`): it is only touched from the
//! UI thread, between link events and user input.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, warn};

/// Callback applying an inbound value to a control.
pub type UpdateFn = Box<dyn FnMut(&Value)>;

struct Entry {
    token: u64,
    apply: UpdateFn,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<String, Entry>,
    next_token: u64,
}

/// Shared handle to the registry. Clones refer to the same map.
#[derive(Clone, Default)]
pub struct SyncRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl SyncRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `apply` under `id` until the returned guard is dropped.
    pub fn register(&self, id: impl Into<String>, apply: impl FnMut(&Value) + 'static) -> Registration {
        let id = id.into();
        let mut inner = self.inner.borrow_mut();
        let token = inner.next_token;
        inner.next_token += 1;

        let previous = inner.entries.insert(
            id.clone(),
            Entry {
                token,
                apply: Box::new(apply),
            },
        );
        if previous.is_some() {
            warn!(id = %id, "duplicate parameter id, latest control takes over updates");
        }

        Registration {
            registry: Rc::downgrade(&self.inner),
            id,
            token,
        }
    }

    /// Hands `value` to the callback registered under `id`.
    ///
    /// Returns `false` when nothing is registered; unknown ids are not an error.
    pub fn dispatch(&self, id: &str, value: &Value) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.entries.get_mut(id) {
            Some(entry) => {
                (entry.apply)(value);
                true
            }
            None => {
                debug!(id, "update for unmounted parameter ignored");
                false
            }
        }
    }

    /// Whether a control is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.inner.borrow().entries.contains_key(id)
    }

    /// Number of registered ids.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SyncRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let mut ids: Vec<_> = inner.entries.keys().collect();
        ids.sort();
        f.debug_struct("SyncRegistry").field("ids", &ids).finish()
    }
}

/// Keeps one registry entry alive; removes it on drop.
#[must_use = "the registry entry is removed as soon as the registration is dropped"]
pub struct Registration {
    registry: Weak<RefCell<RegistryInner>>,
    id: String,
    token: u64,
}

impl Registration {
    /// Id this registration holds.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        // A panicking callback may still hold the borrow while unwinding.
        let Ok(mut inner) = registry.try_borrow_mut() else {
            return;
        };
        if inner.entries.get(&self.id).is_some_and(|e| e.token == self.token) {
            inner.entries.remove(&self.id);
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn recorder() -> (Rc<RefCell<Vec<Value>>>, impl FnMut(&Value) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |v: &Value| sink.borrow_mut().push(v.clone()))
    }

    #[test]
    fn dispatch_reaches_registered_callback() {
        let registry = SyncRegistry::new();
        let (seen, apply) = recorder();
        let _guard = registry.register("P1", apply);

        assert!(registry.dispatch("P1", &json!(7)));
        assert_eq!(*seen.borrow(), vec![json!(7)]);
    }

    #[test]
    fn unknown_id_is_ignored() {
        let registry = SyncRegistry::new();
        assert!(!registry.dispatch("nobody", &json!(1)));
        assert!(registry.is_empty());
    }

    #[test]
    fn dropping_guard_deregisters() {
        let registry = SyncRegistry::new();
        let (seen, apply) = recorder();
        let guard = registry.register("P1", apply);
        assert!(registry.contains("P1"));

        drop(guard);
        assert!(!registry.contains("P1"));
        assert!(!registry.dispatch("P1", &json!(3)));
        assert!(seen.borrow().is_empty());
    }

    #[traced_test]
    #[test]
    fn latest_registration_wins_and_survives_old_guard() {
        let registry = SyncRegistry::new();
        let (first_seen, first) = recorder();
        let (second_seen, second) = recorder();

        let old = registry.register("dup", first);
        let _new = registry.register("dup", second);
        assert!(logs_contain("duplicate parameter id"));

        drop(old);
        assert!(registry.contains("dup"));
        registry.dispatch("dup", &json!("x"));

        assert!(first_seen.borrow().is_empty());
        assert_eq!(*second_seen.borrow(), vec![json!("x")]);
    }

    #[test]
    fn guard_outliving_registry_is_harmless() {
        let registry = SyncRegistry::new();
        let guard = registry.register("P1", |_: &Value| {});
        drop(registry);
        assert_eq!(guard.id(), "P1");
        drop(guard);
    }
}

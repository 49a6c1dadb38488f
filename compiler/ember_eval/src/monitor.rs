//! Monitors for `@synchronized`.
//!
//! Each distinct monitor identity maps to a reentrant lock. Entries are
//! created on first use and removed once no evaluation holds or waits on
//! them.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::ReentrantMutex;

use crate::value::{Value, ValueKey};

/// Identity a block synchronizes on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MonitorKey {
    /// `@synchronized` without a monitor expression.
    Default,
    /// Heap value, by allocation.
    Address(usize),
    /// Scalar value, by value.
    Scalar(ValueKey),
}

impl MonitorKey {
    pub fn of(value: &Value) -> MonitorKey {
        match value.address() {
            Some(address) => MonitorKey::Address(address),
            None => MonitorKey::Scalar(ValueKey::of(value)),
        }
    }
}

/// Registry of monitor locks shared by every evaluation of an engine.
#[derive(Debug, Default)]
pub struct MonitorRegistry {
    locks: DashMap<MonitorKey, Arc<ReentrantMutex<()>>>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `body` while holding the lock for `key`.
    ///
    /// The lock is reentrant: a nested block on the same monitor in the same
    /// thread does not deadlock.
    pub fn with_lock<R>(&self, key: MonitorKey, body: impl FnOnce() -> R) -> R {
        let lock = Arc::clone(
            self.locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(ReentrantMutex::new(())))
                .value(),
        );
        let result = {
            let _guard = lock.lock();
            body()
        };
        drop(lock);
        self.locks
            .remove_if(&key, |_, entry| Arc::strong_count(entry) == 1);
        result
    }

    /// Number of live monitor entries.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn test_reentrant() {
        let registry = MonitorRegistry::new();
        let value = registry.with_lock(MonitorKey::Default, || {
            registry.with_lock(MonitorKey::Default, || 42)
        });
        assert_eq!(value, 42);
    }

    #[test]
    fn test_idle_entries_are_dropped() {
        let registry = MonitorRegistry::new();
        registry.with_lock(MonitorKey::of(&Value::Int(1)), || ());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_key_identity() {
        let a = Value::string("m");
        let b = Value::string("m");
        assert_ne!(MonitorKey::of(&a), MonitorKey::of(&b));
        assert_eq!(MonitorKey::of(&a), MonitorKey::of(&a.clone()));
        assert_eq!(MonitorKey::of(&Value::Int(3)), MonitorKey::of(&Value::Int(3)));
    }

    #[test]
    fn test_excludes_concurrent_sections() {
        let registry = Arc::new(MonitorRegistry::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    for _ in 0..100 {
                        registry.with_lock(MonitorKey::Default, || {
                            assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().is_ok());
        }
    }
}

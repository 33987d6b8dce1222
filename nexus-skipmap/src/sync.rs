//! Coarse-grained locking for sharing a map or set between threads.
//!
//! The containers do no synchronization of their own. [`Synchronized`]
//! puts the whole container behind one `parking_lot::RwLock`:
//!
//! - mutations always hold the write lock for their full duration
//! - reads follow the [`ReadPolicy`] chosen at construction
//!
//! Under either policy a read never overlaps a mutation.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use nexus_skipmap::{ReadPolicy, SkipMap, Synchronized};
//!
//! let shared = Arc::new(Synchronized::new(SkipMap::new(), ReadPolicy::Shared));
//!
//! let handles: Vec<_> = (0..4u64)
//!     .map(|t| {
//!         let shared = Arc::clone(&shared);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 shared.insert(t * 100 + i, i);
//!             }
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(shared.len(), 400);
//! ```

use std::path::Path;
use std::str::FromStr;

use core::fmt;

use parking_lot::RwLock;
use rand_core::RngCore;

use crate::error::PersistError;
use crate::map::SkipMap;
use crate::order::Comparator;
use crate::persist::LoadStats;
use crate::set::SkipSet;

/// How read-only operations take the lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Reads take the write lock: every operation is serialized.
    #[default]
    Exclusive,
    /// Reads take the read lock and may run alongside each other.
    Shared,
}

/// A container behind a single reader-writer lock.
pub struct Synchronized<T> {
    inner: RwLock<T>,
    policy: ReadPolicy,
}

impl<T> Synchronized<T> {
    /// Wraps `inner` with the given read policy.
    pub fn new(inner: T, policy: ReadPolicy) -> Self {
        Self {
            inner: RwLock::new(inner),
            policy,
        }
    }

    /// Returns the read policy.
    #[inline]
    pub fn policy(&self) -> ReadPolicy {
        self.policy
    }

    /// Runs `f` with shared access under the read policy.
    pub fn read<F, O>(&self, f: F) -> O
    where
        F: FnOnce(&T) -> O,
    {
        match self.policy {
            ReadPolicy::Exclusive => {
                let guard = self.inner.write();
                f(&guard)
            }
            ReadPolicy::Shared => {
                let guard = self.inner.read();
                f(&guard)
            }
        }
    }

    /// Runs `f` with exclusive access.
    pub fn write<F, O>(&self, f: F) -> O
    where
        F: FnOnce(&mut T) -> O,
    {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Mutable access without locking; the borrow proves exclusivity.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    /// Unwraps the container.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: fmt::Debug> fmt::Debug for Synchronized<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|inner| {
            f.debug_struct("Synchronized")
                .field("policy", &self.policy)
                .field("inner", inner)
                .finish()
        })
    }
}

impl<K, V, C, R> Synchronized<SkipMap<K, V, C, R>>
where
    C: Comparator<K>,
    R: RngCore,
{
    /// Inserts `key -> value` if `key` is absent.
    pub fn insert(&self, key: K, value: V) -> bool {
        self.write(|map| map.insert(key, value))
    }

    /// Inserts `key -> value`, returning the previous value.
    pub fn upsert(&self, key: K, value: V) -> Option<V> {
        self.write(|map| map.upsert(key, value))
    }

    /// Removes `key`, returning its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.write(|map| map.remove(key))
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.write(|map| map.clear());
    }

    /// Returns a copy of the value for `key`.
    pub fn get_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.read(|map| map.get(key).cloned())
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.read(|map| map.contains_key(key))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.read(|map| map.len())
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.read(|map| map.is_empty())
    }

    /// Dumps the map to `path` under the read policy.
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<usize, PersistError>
    where
        K: fmt::Display,
        V: fmt::Display,
    {
        self.read(|map| map.dump(path))
    }

    /// Loads `path` into the map while holding the write lock.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadStats, PersistError>
    where
        K: FromStr,
        V: FromStr,
    {
        self.write(|map| map.load(path))
    }
}

impl<T, C, R> Synchronized<SkipSet<T, C, R>>
where
    C: Comparator<T>,
    R: RngCore,
{
    /// Adds `value` if no equivalent element is present.
    pub fn insert(&self, value: T) -> bool {
        self.write(|set| set.insert(value))
    }

    /// Removes the element equivalent to `value`.
    pub fn remove(&self, value: &T) -> bool {
        self.write(|set| set.remove(value))
    }

    /// Removes every element.
    pub fn clear(&self) {
        self.write(|set| set.clear());
    }

    /// Returns `true` if an equivalent element is present.
    pub fn contains(&self, value: &T) -> bool {
        self.read(|set| set.contains(value))
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.read(|set| set.len())
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.read(|set| set.is_empty())
    }
}

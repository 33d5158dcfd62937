#![forbid(unsafe_code)]

//! Untracked side-channel storage.
//!
//! Values in [`Refs`] take no part in caching, dependency tracking or
//! notification. Handlers use them to reach objects (a window, a channel, a
//! logger) that must never trigger updates.

use std::any::Any;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use ahash::AHashMap;

/// Type-erased key/value storage carried alongside a model.
pub struct Refs<K> {
    entries: AHashMap<K, Box<dyn Any>>,
}

impl<K> Default for Refs<K> {
    fn default() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Refs<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl<K: Hash + Eq> Refs<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, returning whether a previous entry was
    /// replaced.
    pub fn insert<T: Any>(&mut self, key: K, value: T) -> bool {
        self.entries.insert(key, Box::new(value)).is_some()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<T: Any>(mut self, key: K, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Borrow the entry under `key` if it exists and holds a `T`.
    #[must_use]
    pub fn get<T: Any, Q>(&self, key: &Q) -> Option<&T>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any, Q>(&mut self, key: &Q) -> Option<&mut T>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.get_mut(key)?.downcast_mut()
    }

    /// Remove and return the entry under `key` if it holds a `T`. Entries of
    /// another type are left in place.
    pub fn remove<T: Any, Q>(&mut self, key: &Q) -> Option<T>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if !self.entries.get(key)?.is::<T>() {
            return None;
        }
        let boxed = self.entries.remove(key)?;
        boxed.downcast().ok().map(|value| *value)
    }

    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
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
}

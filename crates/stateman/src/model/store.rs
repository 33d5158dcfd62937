#![forbid(unsafe_code)]

//! Property store: static values, dynamic definitions and the read cache.
//!
//! # Invariants
//!
//! 1. A key lives in at most one of `statics` / `dynamics`. Inserting into
//!    one removes it from the other.
//! 2. `cache` only holds keys of cacheable dynamic properties.
//! 3. Both stores keep declaration order; re-declaring a key of the same kind
//!    keeps its position.

use std::borrow::Borrow;
use std::cell::RefCell;
use std::hash::Hash;

use ahash::{AHashMap, RandomState};
use indexmap::IndexMap;

use crate::definition::PropertyKind;

use super::{Getter, Setter};

pub(crate) struct DynamicProp<K, V> {
    pub(crate) getter: Getter<K, V>,
    pub(crate) setter: Option<Setter<K, V>>,
    pub(crate) cacheable: bool,
}

/// Borrowed view of a declared property.
pub(crate) enum Slot<'a, K, V> {
    Static(&'a V),
    Dynamic(&'a K, &'a DynamicProp<K, V>),
}

pub(crate) struct PropertyStore<K, V> {
    statics: IndexMap<K, V, RandomState>,
    dynamics: IndexMap<K, DynamicProp<K, V>, RandomState>,
    cache: RefCell<AHashMap<K, V>>,
}

impl<K, V> Default for PropertyStore<K, V> {
    fn default() -> Self {
        Self {
            statics: IndexMap::default(),
            dynamics: IndexMap::default(),
            cache: RefCell::new(AHashMap::new()),
        }
    }
}

impl<K: Hash + Eq, V: Clone> PropertyStore<K, V> {
    pub(crate) fn insert_static(&mut self, key: K, value: V) {
        self.dynamics.shift_remove(&key);
        self.cache.get_mut().remove(&key);
        self.statics.insert(key, value);
    }

    pub(crate) fn insert_dynamic(&mut self, key: K, prop: DynamicProp<K, V>) {
        self.statics.shift_remove(&key);
        self.cache.get_mut().remove(&key);
        self.dynamics.insert(key, prop);
    }

    pub(crate) fn slot<Q>(&self, key: &Q) -> Option<Slot<'_, K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some(value) = self.statics.get(key) {
            return Some(Slot::Static(value));
        }
        self.dynamics
            .get_key_value(key)
            .map(|(stored, prop)| Slot::Dynamic(stored, prop))
    }

    pub(crate) fn dynamic<Q>(&self, key: &Q) -> Option<&DynamicProp<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.dynamics.get(key)
    }

    pub(crate) fn static_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.statics.get_mut(key)
    }

    pub(crate) fn kind_of<Q>(&self, key: &Q) -> Option<PropertyKind>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.statics.contains_key(key) {
            Some(PropertyKind::Static)
        } else if self.dynamics.contains_key(key) {
            Some(PropertyKind::Dynamic)
        } else {
            None
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.statics.len() + self.dynamics.len()
    }

    /// Static keys then dynamic keys, each in declaration order.
    pub(crate) fn keys(&self) -> impl DoubleEndedIterator<Item = &K> {
        self.statics.keys().chain(self.dynamics.keys())
    }

    pub(crate) fn cached<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.cache.borrow().get(key).cloned()
    }

    pub(crate) fn is_cached<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.cache.borrow().contains_key(key)
    }

    pub(crate) fn fill_cache(&self, key: K, value: V) {
        self.cache.borrow_mut().insert(key, value);
    }

    /// Drop the cached value for `key`. Returns whether one was present.
    pub(crate) fn invalidate(&mut self, key: &K) -> bool {
        self.cache.get_mut().remove(key).is_some()
    }
}

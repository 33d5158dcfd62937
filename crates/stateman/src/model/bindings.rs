#![forbid(unsafe_code)]

//! Binding registry: per-key handler lists and the global handler list.
//!
//! Lists are append-only and fire in registration order. Callers take a
//! snapshot before invoking handlers, so a handler may register further
//! bindings while it runs; those take effect from the next dispatch.

use std::borrow::Borrow;
use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashMap;

use super::{GlobalHandler, Handler};

pub(crate) struct BindingRegistry<K, V> {
    per_key: AHashMap<K, Vec<Handler<K, V>>>,
    global: Vec<GlobalHandler<K, V>>,
}

impl<K, V> Default for BindingRegistry<K, V> {
    fn default() -> Self {
        Self {
            per_key: AHashMap::new(),
            global: Vec::new(),
        }
    }
}

impl<K: Hash + Eq, V> BindingRegistry<K, V> {
    pub(crate) fn add(&mut self, key: K, handler: Handler<K, V>) {
        self.per_key.entry(key).or_default().push(handler);
    }

    pub(crate) fn add_global(&mut self, handler: GlobalHandler<K, V>) {
        self.global.push(handler);
    }

    /// Handlers bound to `key`, cloned out of the registry.
    pub(crate) fn snapshot<Q>(&self, key: &Q) -> Vec<Handler<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.per_key
            .get(key)
            .map(|handlers| handlers.iter().map(Rc::clone).collect())
            .unwrap_or_default()
    }

    pub(crate) fn global_snapshot(&self) -> Vec<GlobalHandler<K, V>> {
        self.global.iter().map(Rc::clone).collect()
    }

    pub(crate) fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.per_key.get(key).map_or(0, Vec::len)
    }

    pub(crate) fn global_count(&self) -> usize {
        self.global.len()
    }
}

#![forbid(unsafe_code)]

//! Dependents adjacency and the dependency walk.
//!
//! For each key the graph records the dynamic properties that list it as a
//! dependency, in declaration order. Edges are append-only and duplicate
//! edges are kept; deduplication happens when the walk result is collected
//! into the affected set.
//!
//! # Walk order
//!
//! [`DependentsGraph::affected`] is a pre-order depth-first traversal: the
//! root first, then each direct dependent followed by its own walk, in
//! dependents-list order, keeping the first occurrence of every key. A key
//! that is already in the set is not descended into again: everything below
//! it was collected on its first visit, so the result equals the
//! deduplicated full walk while each key is expanded once.
//!
//! # Cycles
//!
//! A revisit never recurses, so cyclic graphs terminate either way. With the
//! guard, an edge that leads back to a key on the current path is reported
//! as `model.cycle_skipped`; on acyclic graphs the guard never fires and the
//! order is identical.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;

use ahash::{AHashMap, AHashSet, RandomState};
use indexmap::IndexSet;

pub(crate) struct DependentsGraph<K> {
    edges: AHashMap<K, Vec<K>>,
}

impl<K> Default for DependentsGraph<K> {
    fn default() -> Self {
        Self {
            edges: AHashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone + Debug> DependentsGraph<K> {
    /// Make sure `key` has a dependents entry, possibly empty.
    pub(crate) fn ensure(&mut self, key: K) {
        self.edges.entry(key).or_default();
    }

    /// Record that `dependent` depends on `dependency`.
    pub(crate) fn add_edge(&mut self, dependency: K, dependent: K) {
        self.edges.entry(dependency).or_default().push(dependent);
    }

    pub(crate) fn dependents<Q>(&self, key: &Q) -> &[K]
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.edges.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The stored key equal to `key`, if it has an entry.
    pub(crate) fn stored_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.edges.get_key_value(key).map(|(stored, _)| stored)
    }

    /// Keys affected by a change to `root`, in first-visit pre-order.
    /// `root` is always the first element.
    pub(crate) fn affected(&self, root: &K, cycle_guard: bool) -> IndexSet<K, RandomState> {
        let mut order = IndexSet::default();
        order.insert(root.clone());
        if cycle_guard {
            let mut path = AHashSet::new();
            self.walk_guarded(root, &mut path, &mut order);
        } else {
            self.walk_into(root, &mut order);
        }
        order
    }

    fn walk_into(&self, key: &K, order: &mut IndexSet<K, RandomState>) {
        for dependent in self.dependents(key) {
            if order.insert(dependent.clone()) {
                self.walk_into(dependent, order);
            }
        }
    }

    fn walk_guarded(
        &self,
        key: &K,
        path: &mut AHashSet<K>,
        order: &mut IndexSet<K, RandomState>,
    ) {
        path.insert(key.clone());
        for dependent in self.dependents(key) {
            if path.contains(dependent) {
                tracing::warn!(
                    message = "model.cycle_skipped",
                    from = ?key,
                    to = ?dependent
                );
                continue;
            }
            if order.insert(dependent.clone()) {
                self.walk_guarded(dependent, path, order);
            }
        }
        path.remove(key);
    }
}

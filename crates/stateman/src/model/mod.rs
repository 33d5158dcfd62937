#![forbid(unsafe_code)]

//! The property model.
//!
//! A [`Model`] maps keys to static values and to dynamic properties computed
//! by getters. Dependencies are declared explicitly; nothing is inferred from
//! what a getter happens to read.
//!
//! # Propagation
//!
//! Assigning a static property that already exists runs one propagation
//! cycle rooted at that key:
//!
//! 1. Walk the dependents graph pre-order from the root, keeping the first
//!    occurrence of each key (the affected set, root first). A key already
//!    collected is not expanded again.
//! 2. Snapshot the bindings that will fire.
//! 3. Drop the cached value of every affected key.
//! 4. For each affected key, in order: fire every global binding with
//!    [`Event::Changed`], then fire the per-key bindings selected by
//!    [`BindingDispatch`].
//!
//! With the default [`BindingDispatch::RootKey`], step 4 fires the bindings
//! registered under the *root* key once per affected key, and bindings on
//! dependents never fire. [`BindingDispatch::EachKey`] fires each key's own
//! bindings instead.
//!
//! # Cache states
//!
//! A cacheable dynamic property is either invalid (no entry) or valid
//! (entry holds the last computed value). A read moves it to valid, a
//! propagation that reaches it moves it back. Non-cacheable properties are
//! never stored.
//!
//! # Re-entrancy
//!
//! Everything runs synchronously on the caller's thread. Handlers receive
//! `&mut Model` and may read, write and bind; nested writes run nested
//! propagation cycles. Bindings registered while a cycle dispatches take
//! effect from the next cycle. Dependency cycles do not hang the walk;
//! [`ModelConfig::cycle_guard`] additionally reports them. Getters that read
//! each other in a loop, or handlers that keep writing each other's
//! dependencies, still recurse without bound.

mod bindings;
mod graph;
mod store;

use std::borrow::Borrow;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::rc::Rc;

use crate::config::{BindingDispatch, ModelConfig};
use crate::definition::{DynamicDef, PropertyDef, PropertyKind, Shape, classify};
use crate::error::{ModelError, Result};
use crate::event::Event;
use crate::refs::Refs;

use bindings::BindingRegistry;
use graph::DependentsGraph;
use store::{DynamicProp, PropertyStore, Slot};

/// Computes a dynamic property from the model.
pub type Getter<K, V> = Rc<dyn Fn(&Model<K, V>) -> Result<V>>;
/// Receives a value written to a dynamic property and updates other state.
pub type Setter<K, V> = Rc<dyn Fn(&mut Model<K, V>, V) -> Result<()>>;
/// Per-key binding, called with the model and the key that changed.
pub type Handler<K, V> = Rc<dyn Fn(&mut Model<K, V>, &K)>;
/// Global binding, called for every declaration and every change.
pub type GlobalHandler<K, V> = Rc<dyn Fn(Event, &mut Model<K, V>, &K)>;

/// Property container with explicit dependencies, cached dynamic
/// properties and synchronous bindings.
///
/// # Example
///
/// ```
/// use stateman::{DynamicDef, Model};
///
/// type M = Model<&'static str, i32>;
///
/// let mut model = M::from_literal([("x", 1), ("y", 2)]);
/// model.declare_dynamic(
///     "sum",
///     DynamicDef::new(|m: &M| Ok(m.get("x")? + m.get("y")?), ["x", "y"]),
/// );
/// assert_eq!(model.get("sum").unwrap(), 3);
///
/// model.set("x", 10).unwrap();
/// assert_eq!(model.get("sum").unwrap(), 12);
/// ```
pub struct Model<K, V> {
    store: PropertyStore<K, V>,
    graph: DependentsGraph<K>,
    bindings: BindingRegistry<K, V>,
    refs: Refs<K>,
    config: ModelConfig,
}

impl<K, V> Debug for Model<K, V>
where
    K: Hash + Eq + Clone + Debug + 'static,
    V: Clone + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("refs", &self.refs)
            .field("global_bindings", &self.bindings.global_count())
            .field("config", &self.config)
            .finish()
    }
}

impl<K, V> Default for Model<K, V>
where
    K: Hash + Eq + Clone + Debug + 'static,
    V: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Model<K, V>
where
    K: Hash + Eq + Clone + Debug + 'static,
    V: Clone + 'static,
{
    /// Create an empty model with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    /// Create an empty model.
    #[must_use]
    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            store: PropertyStore::default(),
            graph: DependentsGraph::default(),
            bindings: BindingRegistry::default(),
            refs: Refs::default(),
            config,
        }
    }

    /// Create a model from typed definitions, declared in iteration order.
    pub fn from_definitions(defs: impl IntoIterator<Item = (K, PropertyDef<K, V>)>) -> Self {
        let mut model = Self::new();
        model.declare_all(defs);
        model
    }

    /// Create a model where every entry is a static property.
    pub fn from_literal(props: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut model = Self::new();
        for (key, value) in props {
            model.declare_static(key, value);
        }
        model
    }

    /// Replace the configuration. Combines with the bulk constructors, which
    /// start from the defaults.
    #[must_use]
    pub fn configured(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the side-channel storage.
    #[must_use]
    pub fn with_refs(mut self, refs: Refs<K>) -> Self {
        self.refs = refs;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Untracked side-channel storage.
    #[must_use]
    pub fn refs(&self) -> &Refs<K> {
        &self.refs
    }

    pub fn refs_mut(&mut self) -> &mut Refs<K> {
        &mut self.refs
    }

    // ── Declaration ─────────────────────────────────────────────────────

    /// Declare `key` from a definition of either kind.
    pub fn declare(&mut self, key: K, def: PropertyDef<K, V>) {
        match def {
            PropertyDef::Static(value) => self.declare_static(key, value),
            PropertyDef::Dynamic(def) => self.declare_dynamic(key, def),
        }
    }

    /// Declare several properties in iteration order.
    pub fn declare_all(&mut self, defs: impl IntoIterator<Item = (K, PropertyDef<K, V>)>) {
        for (key, def) in defs {
            self.declare(key, def);
        }
    }

    /// Declare (or overwrite) a static property and fire `new` to global
    /// bindings. Existing dependents and bindings are left untouched, and no
    /// change propagation runs.
    pub fn declare_static(&mut self, key: K, value: V) {
        tracing::debug!(message = "model.declare", key = ?key, kind = "static");
        self.graph.ensure(key.clone());
        self.store.insert_static(key.clone(), value);
        self.emit_new(&key);
    }

    /// Declare (or overwrite) a dynamic property and fire `new` to global
    /// bindings.
    ///
    /// Each dependency gains `key` as a dependent, appended after existing
    /// dependents. Dependencies may name keys that are not declared yet.
    /// Edges from an earlier declaration of `key` remain in place.
    pub fn declare_dynamic(&mut self, key: K, def: DynamicDef<K, V>) {
        let DynamicDef {
            getter,
            dependencies,
            setter,
            cacheable,
        } = def;
        tracing::debug!(
            message = "model.declare",
            key = ?key,
            kind = "dynamic",
            dependencies = dependencies.len(),
            cacheable
        );
        self.graph.ensure(key.clone());
        for dependency in dependencies {
            self.graph.add_edge(dependency, key.clone());
        }
        self.store.insert_dynamic(
            key.clone(),
            DynamicProp {
                getter,
                setter,
                cacheable,
            },
        );
        self.emit_new(&key);
    }

    // ── Read / write ────────────────────────────────────────────────────

    /// Read a property.
    ///
    /// Static values are returned directly. A cacheable dynamic property is
    /// computed on the first read after an invalidation and memoized; a
    /// non-cacheable one is computed on every read.
    ///
    /// # Errors
    ///
    /// [`ModelError::KeyNotFound`] if `key` is not declared, or any error
    /// returned by the getter.
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + Debug,
    {
        match self.store.slot(key) {
            Some(Slot::Static(value)) => Ok(value.clone()),
            Some(Slot::Dynamic(stored, prop)) => self.read_dynamic(stored, prop),
            None => Err(ModelError::key_not_found(key)),
        }
    }

    fn read_dynamic(&self, key: &K, prop: &DynamicProp<K, V>) -> Result<V> {
        if !prop.cacheable {
            tracing::trace!(message = "model.cache_bypass", key = ?key);
            return (prop.getter)(self);
        }
        if let Some(value) = self.store.cached(key) {
            return Ok(value);
        }
        let value = (prop.getter)(self)?;
        tracing::trace!(message = "model.cache_fill", key = ?key);
        self.store.fill_cache(key.clone(), value.clone());
        Ok(value)
    }

    /// Write a property.
    ///
    /// - Dynamic: the setter runs with `value`. The property's own value is
    ///   still whatever its getter produces.
    /// - Static: the value is replaced and a propagation cycle runs.
    /// - Unknown: the key is declared static and `new` fires; nothing else.
    ///
    /// # Errors
    ///
    /// [`ModelError::NoSetter`] for a dynamic property without a setter, or
    /// any error returned by the setter.
    pub fn set(&mut self, key: K, value: V) -> Result<()> {
        if let Some(prop) = self.store.dynamic(&key) {
            let setter = prop
                .setter
                .clone()
                .ok_or_else(|| ModelError::no_setter(&key))?;
            return setter(self, value);
        }
        if let Some(slot) = self.store.static_mut(&key) {
            *slot = value;
            self.propagate(&key);
            return Ok(());
        }
        self.declare_static(key, value);
        Ok(())
    }

    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.kind_of(key).is_some()
    }

    /// Whether `key` is static or dynamic, or `None` if undeclared.
    #[must_use]
    pub fn kind_of<Q>(&self, key: &Q) -> Option<PropertyKind>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.kind_of(key)
    }

    /// Number of declared properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Static keys then dynamic keys, each in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.store.keys()
    }

    /// Dynamic keys (latest first) then static keys (latest first).
    pub fn keys_rev(&self) -> impl Iterator<Item = &K> {
        self.store.keys().rev()
    }

    /// Whether a cacheable dynamic property currently holds a cached value.
    #[must_use]
    pub fn is_cached<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.is_cached(key)
    }

    // ── Bindings ────────────────────────────────────────────────────────

    /// Bind `handler` to a declared property.
    ///
    /// # Errors
    ///
    /// [`ModelError::KeyNotFound`] if `key` is not declared.
    pub fn bind(&mut self, key: K, handler: impl Fn(&mut Self, &K) + 'static) -> Result<()> {
        if !self.contains(&key) {
            return Err(ModelError::key_not_found(&key));
        }
        self.bindings.add(key, Rc::new(handler));
        Ok(())
    }

    /// Bind one handler under each key in turn.
    ///
    /// Every key is checked before any binding is registered.
    ///
    /// # Errors
    ///
    /// [`ModelError::KeyNotFound`] for the first undeclared key.
    pub fn bind_each(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        handler: impl Fn(&mut Self, &K) + 'static,
    ) -> Result<()> {
        let keys: Vec<K> = keys.into_iter().collect();
        if let Some(missing) = keys.iter().find(|key| !self.contains(*key)) {
            return Err(ModelError::key_not_found(missing));
        }
        let handler: Handler<K, V> = Rc::new(handler);
        for key in keys {
            self.bindings.add(key, Rc::clone(&handler));
        }
        Ok(())
    }

    /// Bind a handler to every declaration and every change.
    pub fn bind_all(&mut self, handler: impl Fn(Event, &mut Self, &K) + 'static) {
        self.bindings.add_global(Rc::new(handler));
    }

    /// Number of per-key bindings registered under `key`.
    #[must_use]
    pub fn binding_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.bindings.count(key)
    }

    #[must_use]
    pub fn global_binding_count(&self) -> usize {
        self.bindings.global_count()
    }

    // ── Propagation ─────────────────────────────────────────────────────

    /// Run a propagation cycle for `key` without changing any value.
    ///
    /// Use this after mutating state the model cannot see (for example an
    /// object reached through a static property).
    ///
    /// # Errors
    ///
    /// [`ModelError::KeyNotFound`] if `key` was never declared nor named as a
    /// dependency.
    pub fn notify_changed<Q>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + Debug,
    {
        let root = self
            .graph
            .stored_key(key)
            .cloned()
            .ok_or_else(|| ModelError::key_not_found(key))?;
        self.propagate(&root);
        Ok(())
    }

    /// The affected set a change to `key` would produce, root first, without
    /// invalidating or notifying anything.
    ///
    /// # Errors
    ///
    /// [`ModelError::KeyNotFound`] if `key` was never declared nor named as a
    /// dependency.
    pub fn affected<Q>(&self, key: &Q) -> Result<Vec<K>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + Debug,
    {
        let root = self
            .graph
            .stored_key(key)
            .ok_or_else(|| ModelError::key_not_found(key))?;
        Ok(self
            .graph
            .affected(root, self.config.cycle_guard)
            .into_iter()
            .collect())
    }

    /// Direct dependents of `key`, in declaration order, duplicates kept.
    #[must_use]
    pub fn dependents_of<Q>(&self, key: &Q) -> &[K]
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.graph.dependents(key)
    }

    fn propagate(&mut self, root: &K) {
        let affected = self.graph.affected(root, self.config.cycle_guard);
        let span = tracing::debug_span!("model.propagate", root = ?root);
        let _guard = span.enter();
        tracing::debug!(message = "model.propagate", root = ?root, affected = affected.len());

        for key in &affected {
            self.store.invalidate(key);
        }

        let global = self.bindings.global_snapshot();
        let root_handlers = self.bindings.snapshot(root);
        let per_key: Vec<Vec<Handler<K, V>>> = affected
            .iter()
            .map(|key| match self.config.binding_dispatch {
                BindingDispatch::RootKey => root_handlers.clone(),
                BindingDispatch::EachKey => self.bindings.snapshot(key),
            })
            .collect();

        for (key, handlers) in affected.iter().zip(&per_key) {
            for handler in &global {
                handler(Event::Changed, self, key);
            }
            for handler in handlers {
                handler(self, key);
            }
        }
    }

    fn emit_new(&mut self, key: &K) {
        for handler in self.bindings.global_snapshot() {
            handler(Event::New, self, key);
        }
    }
}

impl<K, V> Model<K, V>
where
    K: Hash + Eq + Clone + Debug + 'static,
    V: Shape<K> + Clone + 'static,
{
    /// Bulk construction from loosely-typed values.
    ///
    /// With `literal` every entry is static. Otherwise each value is
    /// classified by its shape (see [`crate::definition`]): values that look
    /// like `[getter, deps, setter?, cache?]` become dynamic properties and
    /// everything else is static.
    pub fn construct(props: impl IntoIterator<Item = (K, V)>, literal: bool, refs: Refs<K>) -> Self {
        let mut model = Self::new().with_refs(refs);
        for (key, value) in props {
            if literal {
                model.declare_static(key, value);
            } else {
                model.declare(key, classify(value));
            }
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use tracing_test::traced_test;

    use super::*;

    type M = Model<&'static str, i64>;

    fn sum_model() -> M {
        let mut model = M::from_literal([("x", 1), ("y", 2)]);
        model.declare_dynamic(
            "sum",
            DynamicDef::new(|m: &M| Ok(m.get("x")? + m.get("y")?), ["x", "y"]),
        );
        model
    }

    #[test]
    fn static_read_back() {
        let model = M::from_literal([("a", 7)]);
        assert_eq!(model.get("a"), Ok(7));
    }

    #[test]
    fn dynamic_recomputes_after_dependency_change() {
        let mut model = sum_model();
        assert_eq!(model.get("sum"), Ok(3));
        model.set("x", 10).unwrap();
        assert_eq!(model.get("sum"), Ok(12));
    }

    #[test]
    fn cache_state_transitions() {
        let calls = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&calls);
        let mut model = M::from_literal([("x", 1)]);
        model.declare_dynamic(
            "double",
            DynamicDef::new(
                move |m: &M| {
                    counter.set(counter.get() + 1);
                    Ok(m.get("x")? * 2)
                },
                ["x"],
            ),
        );

        assert!(!model.is_cached("double"));
        assert_eq!(model.get("double"), Ok(2));
        assert!(model.is_cached("double"));
        assert_eq!(model.get("double"), Ok(2));
        assert_eq!(calls.get(), 1);

        model.set("x", 5).unwrap();
        assert!(!model.is_cached("double"));
        assert_eq!(model.get("double"), Ok(10));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn uncached_calls_getter_every_time() {
        let calls = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&calls);
        let mut model = M::new();
        model.declare_dynamic(
            "tick",
            DynamicDef::new(
                move |_: &M| {
                    counter.set(counter.get() + 1);
                    Ok(i64::from(counter.get()))
                },
                [],
            )
            .uncached(),
        );

        assert_eq!(model.get("tick"), Ok(1));
        assert_eq!(model.get("tick"), Ok(2));
        assert!(!model.is_cached("tick"));
    }

    #[test]
    fn getter_error_is_not_cached() {
        let mut model = M::new();
        model.declare_dynamic("d", DynamicDef::new(|m: &M| m.get("later"), ["later"]));
        assert_eq!(
            model.get("d"),
            Err(ModelError::KeyNotFound {
                key: "\"later\"".into()
            })
        );
        assert!(!model.is_cached("d"));

        model.set("later", 4).unwrap();
        assert_eq!(model.get("d"), Ok(4));
    }

    #[test]
    fn missing_key_errors() {
        let mut model = sum_model();
        assert!(matches!(model.get("nope"), Err(ModelError::KeyNotFound { .. })));
        assert!(matches!(
            model.bind("nope", |_, _| {}),
            Err(ModelError::KeyNotFound { .. })
        ));
        assert!(matches!(model.set("sum", 1), Err(ModelError::NoSetter { .. })));
        assert!(matches!(
            model.notify_changed("nope"),
            Err(ModelError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn setter_writes_other_properties() {
        let mut model = M::from_literal([("x", 1)]);
        model.declare_dynamic(
            "x_plus_one",
            DynamicDef::new(|m: &M| Ok(m.get("x")? + 1), ["x"])
                .with_setter(|m: &mut M, v| m.set("x", v - 1)),
        );
        model.set("x_plus_one", 10).unwrap();
        assert_eq!(model.get("x"), Ok(9));
        assert_eq!(model.get("x_plus_one"), Ok(10));
    }

    #[test]
    fn unknown_set_declares_static_without_changed() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&events);
        let mut model = M::new();
        model.bind_all(move |event, _, key| log.borrow_mut().push((event, *key)));

        model.set("fresh", 3).unwrap();
        assert_eq!(model.get("fresh"), Ok(3));
        assert_eq!(*RefCell::borrow(&events), [(Event::New, "fresh")]);
    }

    #[test]
    fn redeclare_switches_kind() {
        let mut model = sum_model();
        let _ = model.get("sum");
        model.declare_static("sum", 100);
        assert_eq!(model.kind_of("sum"), Some(PropertyKind::Static));
        assert!(!model.is_cached("sum"));
        assert_eq!(model.get("sum"), Ok(100));
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn root_key_dispatch_fires_root_bindings_for_each_key() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut model = sum_model();

        let log = Rc::clone(&seen);
        model.bind("x", move |_, key| log.borrow_mut().push(("x", *key))).unwrap();
        let log = Rc::clone(&seen);
        model.bind("sum", move |_, key| log.borrow_mut().push(("sum", *key))).unwrap();

        model.set("x", 2).unwrap();
        assert_eq!(*RefCell::borrow(&seen), [("x", "x"), ("x", "sum")]);
    }

    #[test]
    fn each_key_dispatch_fires_own_bindings() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut model = sum_model()
            .configured(ModelConfig::default().with_binding_dispatch(BindingDispatch::EachKey));

        let log = Rc::clone(&seen);
        model.bind("x", move |_, key| log.borrow_mut().push(("x", *key))).unwrap();
        let log = Rc::clone(&seen);
        model.bind("sum", move |_, key| log.borrow_mut().push(("sum", *key))).unwrap();

        model.set("x", 2).unwrap();
        assert_eq!(*RefCell::borrow(&seen), [("x", "x"), ("sum", "sum")]);
    }

    #[test]
    fn bindings_added_mid_cycle_skip_remaining_keys() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut model = sum_model();

        let log = Rc::clone(&seen);
        model.bind_all(move |_, m, key| {
            log.borrow_mut().push(("global", *key));
            if *key == "x" && m.global_binding_count() == 1 {
                let late = Rc::clone(&log);
                m.bind_all(move |_, _, key| late.borrow_mut().push(("late global", *key)));
                let late = Rc::clone(&log);
                m.bind("x", move |_, key| late.borrow_mut().push(("late x", *key)))
                    .unwrap();
            }
        });

        model.set("x", 5).unwrap();
        assert_eq!(*RefCell::borrow(&seen), [("global", "x"), ("global", "sum")]);

        seen.borrow_mut().clear();
        model.set("x", 6).unwrap();
        assert_eq!(
            *RefCell::borrow(&seen),
            [
                ("global", "x"),
                ("late global", "x"),
                ("late x", "x"),
                ("global", "sum"),
                ("late global", "sum"),
                ("late x", "sum"),
            ]
        );
    }

    #[test]
    fn configured_applies_to_bulk_constructors() {
        let config = ModelConfig::default()
            .with_binding_dispatch(BindingDispatch::EachKey)
            .with_cycle_guard(true);
        let model = M::from_literal([("x", 1)]).configured(config);
        assert_eq!(*model.config(), config);
    }

    #[test]
    fn bind_each_validates_before_registering() {
        let mut model = sum_model();
        let result = model.bind_each(["x", "missing", "y"], |_, _| {});
        assert!(matches!(result, Err(ModelError::KeyNotFound { .. })));
        assert_eq!(model.binding_count("x"), 0);

        model.bind_each(["x", "y"], |_, _| {}).unwrap();
        assert_eq!(model.binding_count("x"), 1);
        assert_eq!(model.binding_count("y"), 1);
    }

    #[test]
    fn handler_can_write_model() {
        let mut model = M::from_literal([("celsius", 0), ("fahrenheit", 32)]);
        model
            .bind("celsius", |m, _| {
                let c = m.get("celsius").unwrap_or_default();
                m.set("fahrenheit", c * 9 / 5 + 32).unwrap();
            })
            .unwrap();
        model.set("celsius", 100).unwrap();
        assert_eq!(model.get("fahrenheit"), Ok(212));
    }

    #[test]
    fn notify_changed_invalidates_without_write() {
        let external = Rc::new(Cell::new(1i64));
        let source = Rc::clone(&external);
        let mut model = M::from_literal([("handle", 0)]);
        model.declare_dynamic(
            "reading",
            DynamicDef::new(move |_: &M| Ok(source.get()), ["handle"]),
        );
        assert_eq!(model.get("reading"), Ok(1));
        external.set(2);
        assert_eq!(model.get("reading"), Ok(1));
        model.notify_changed("handle").unwrap();
        assert_eq!(model.get("reading"), Ok(2));
    }

    #[test]
    fn forward_reference_gets_dependents_entry() {
        let mut model = M::new();
        model.declare_dynamic("d", DynamicDef::new(|m: &M| m.get("later"), ["later"]));
        assert_eq!(model.dependents_of("later"), ["d"]);
        assert_eq!(model.affected("later"), Ok(vec!["later", "d"]));
        assert!(!model.contains("later"));
    }

    #[test]
    fn iteration_orders() {
        let mut model = sum_model();
        model.declare_static("z", 0);
        let forward: Vec<_> = model.keys().copied().collect();
        assert_eq!(forward, ["x", "y", "z", "sum"]);
        let reverse: Vec<_> = model.keys_rev().copied().collect();
        assert_eq!(reverse, ["sum", "z", "y", "x"]);
    }

    #[test]
    fn typed_definitions_declare_in_order() {
        let model = M::from_definitions([
            ("a", PropertyDef::Static(2)),
            (
                "b",
                DynamicDef::new(|m: &M| Ok(m.get("a")? * 10), ["a"]).into(),
            ),
        ]);
        assert_eq!(model.kind_of("a"), Some(PropertyKind::Static));
        assert_eq!(model.kind_of("b"), Some(PropertyKind::Dynamic));
        assert_eq!(model.get("b"), Ok(20));
        assert_eq!(model.global_binding_count(), 0);
    }

    #[test]
    fn debug_lists_keys() {
        let dbg = format!("{:?}", sum_model());
        assert!(dbg.contains("Model"));
        assert!(dbg.contains("\"sum\""));
    }

    #[test]
    #[traced_test]
    fn logs_declare_and_propagate() {
        let mut model = sum_model();
        model.set("x", 3).unwrap();
        assert!(logs_contain("model.declare"));
        assert!(logs_contain("model.propagate"));
    }

    #[test]
    #[traced_test]
    fn logs_cache_paths() {
        let mut model = sum_model();
        model.declare_dynamic("now", DynamicDef::new(|_: &M| Ok(0), []).uncached());
        let _ = model.get("sum");
        let _ = model.get("now");
        assert!(logs_contain("model.cache_fill"));
        assert!(logs_contain("model.cache_bypass"));
    }

    #[test]
    #[traced_test]
    fn cycle_guard_terminates_and_warns() {
        let mut model = M::with_config(ModelConfig::default().with_cycle_guard(true));
        model.declare_static("seed", 0);
        model.declare_dynamic("a", DynamicDef::new(|_: &M| Ok(1), ["seed", "b"]));
        model.declare_dynamic("b", DynamicDef::new(|_: &M| Ok(2), ["a"]));

        assert_eq!(model.affected("seed"), Ok(vec!["seed", "a", "b"]));
        model.set("seed", 1).unwrap();
        assert!(logs_contain("model.cycle_skipped"));
    }
}

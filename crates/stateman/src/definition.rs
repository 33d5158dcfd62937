#![forbid(unsafe_code)]

//! Property definitions and the bulk-construction classifier.
//!
//! Typed callers describe properties with [`PropertyDef`]. Loosely-typed
//! callers hand the model raw values whose type implements [`Shape`]; each
//! value is then sniffed with [`classify`] and becomes either a static value
//! or a dynamic definition.
//!
//! # Shape rules
//!
//! A value is a dynamic definition if and only if it is a sequence of one of
//! these forms, where `deps` is a sequence whose elements are all keys:
//!
//! | len | layout                             |
//! |-----|------------------------------------|
//! | 2   | `[getter, deps]`                   |
//! | 3   | `[getter, deps, setter]`           |
//! | 4   | `[getter, deps, setter, cache]`    |
//!
//! Anything else is static. A static value that happens to match one of
//! these layouts is classified as dynamic; literal construction exists to
//! sidestep that.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::model::{Getter, Model, Setter};

/// Which store a declared key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Static,
    Dynamic,
}

/// A dynamic property: a getter over the model, the keys whose changes
/// invalidate it, an optional setter, and whether reads are memoized.
pub struct DynamicDef<K, V> {
    pub getter: Getter<K, V>,
    pub dependencies: Vec<K>,
    pub setter: Option<Setter<K, V>>,
    pub cacheable: bool,
}

impl<K, V> DynamicDef<K, V> {
    /// A cacheable dynamic property without a setter.
    pub fn new(
        getter: impl Fn(&Model<K, V>) -> Result<V> + 'static,
        dependencies: impl IntoIterator<Item = K>,
    ) -> Self {
        Self {
            getter: Rc::new(getter),
            dependencies: dependencies.into_iter().collect(),
            setter: None,
            cacheable: true,
        }
    }

    /// Attach a setter. Setters write other properties; the dynamic value is
    /// still produced by the getter.
    #[must_use]
    pub fn with_setter(mut self, setter: impl Fn(&mut Model<K, V>, V) -> Result<()> + 'static) -> Self {
        self.setter = Some(Rc::new(setter));
        self
    }

    /// Set whether reads are memoized.
    #[must_use]
    pub fn cached(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Shorthand for `cached(false)`.
    #[must_use]
    pub fn uncached(self) -> Self {
        self.cached(false)
    }
}

impl<K: Clone, V> Clone for DynamicDef<K, V> {
    fn clone(&self) -> Self {
        Self {
            getter: Rc::clone(&self.getter),
            dependencies: self.dependencies.clone(),
            setter: self.setter.clone(),
            cacheable: self.cacheable,
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for DynamicDef<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicDef")
            .field("dependencies", &self.dependencies)
            .field("has_setter", &self.setter.is_some())
            .field("cacheable", &self.cacheable)
            .finish()
    }
}

/// Declaration of a single property.
pub enum PropertyDef<K, V> {
    Static(V),
    Dynamic(DynamicDef<K, V>),
}

impl<K, V> PropertyDef<K, V> {
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Static(_) => PropertyKind::Static,
            Self::Dynamic(_) => PropertyKind::Dynamic,
        }
    }
}

impl<K, V> From<DynamicDef<K, V>> for PropertyDef<K, V> {
    fn from(def: DynamicDef<K, V>) -> Self {
        Self::Dynamic(def)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PropertyDef<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Dynamic(def) => f.debug_tuple("Dynamic").field(def).finish(),
        }
    }
}

/// Structural view of a loosely-typed value, used by [`classify`].
///
/// Every method defaults to `None`, so value types that never encode
/// definitions implement it with an empty `impl` block.
pub trait Shape<K>: Sized {
    /// Elements, if the value is an ordered sequence.
    fn as_sequence(&self) -> Option<&[Self]> {
        None
    }

    fn as_getter(&self) -> Option<Getter<K, Self>> {
        None
    }

    fn as_setter(&self) -> Option<Setter<K, Self>> {
        None
    }

    fn as_flag(&self) -> Option<bool> {
        None
    }

    /// The value read as a property key, for dependency lists.
    fn as_key(&self) -> Option<K> {
        None
    }
}

/// Classify `value` per the shape rules in the module docs.
pub fn classify<K, V: Shape<K>>(value: V) -> PropertyDef<K, V> {
    match sniff(&value) {
        Some(def) => PropertyDef::Dynamic(def),
        None => PropertyDef::Static(value),
    }
}

/// Whether `value` would be classified as a dynamic definition.
pub fn is_dynamic_definition<K, V: Shape<K>>(value: &V) -> bool {
    sniff(value).is_some()
}

fn sniff<K, V: Shape<K>>(value: &V) -> Option<DynamicDef<K, V>> {
    let (getter, deps, setter, flag) = match value.as_sequence()? {
        [getter, deps] => (getter, deps, None, None),
        [getter, deps, setter] => (getter, deps, Some(setter), None),
        [getter, deps, setter, flag] => (getter, deps, Some(setter), Some(flag)),
        _ => return None,
    };
    let setter = match setter {
        Some(setter) => Some(setter.as_setter()?),
        None => None,
    };
    let cacheable = match flag {
        Some(flag) => flag.as_flag()?,
        None => true,
    };
    let getter = getter.as_getter()?;
    let dependencies = deps
        .as_sequence()?
        .iter()
        .map(|item| item.as_key())
        .collect::<Option<Vec<K>>>()?;
    Some(DynamicDef {
        getter,
        dependencies,
        setter,
        cacheable,
    })
}

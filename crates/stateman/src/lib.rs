#![forbid(unsafe_code)]

//! Stateman: a property model with explicit dependencies.
//!
//! Static properties are set directly. Dynamic properties are computed by a
//! getter from other properties listed up front as dependencies, optionally
//! memoized until one of them changes. Bindings run synchronously when a
//! property changes, and global bindings see every declaration and change.
//!
//! See [`Model`] for the propagation rules and [`definition`] for bulk
//! construction from loosely-typed values.

pub mod config;
pub mod definition;
pub mod error;
pub mod event;
pub mod model;
pub mod refs;
pub mod value;

pub use config::{BindingDispatch, ModelConfig};
pub use definition::{DynamicDef, PropertyDef, PropertyKind, Shape, classify, is_dynamic_definition};
pub use error::{ModelError, Result};
pub use event::Event;
pub use model::{Getter, GlobalHandler, Handler, Model, Setter};
pub use refs::Refs;
pub use value::{Value, ValueModel};

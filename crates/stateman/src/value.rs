#![forbid(unsafe_code)]

//! Loosely-typed values for heterogeneous models.
//!
//! [`Value`] holds plain data alongside getters and setters, so a single
//! literal list can mix static values with dynamic definitions and be fed to
//! [`Model::construct`](crate::Model::construct):
//!
//! ```
//! use stateman::{Refs, Value, ValueModel};
//!
//! let model = ValueModel::construct(
//!     [
//!         ("x".to_string(), Value::Int(1)),
//!         ("y".to_string(), Value::Int(2)),
//!         (
//!             "sum".to_string(),
//!             Value::list([
//!                 Value::getter(|m| {
//!                     let x = m.get("x")?.as_int().unwrap_or(0);
//!                     let y = m.get("y")?.as_int().unwrap_or(0);
//!                     Ok(Value::Int(x + y))
//!                 }),
//!                 Value::keys(["x", "y"]),
//!             ]),
//!         ),
//!     ],
//!     false,
//!     Refs::new(),
//! );
//! assert_eq!(model.get("sum"), Ok(Value::Int(3)));
//! ```

use std::fmt;
use std::rc::Rc;

use crate::definition::Shape;
use crate::error::Result;
use crate::model::{Getter, Model, Setter};

/// Model keyed by strings over [`Value`].
pub type ValueModel = Model<String, Value>;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Getter(Getter<String, Value>),
    Setter(Setter<String, Value>),
}

impl Value {
    pub fn getter(f: impl Fn(&ValueModel) -> Result<Value> + 'static) -> Self {
        Self::Getter(Rc::new(f))
    }

    pub fn setter(f: impl Fn(&mut ValueModel, Value) -> Result<()> + 'static) -> Self {
        Self::Setter(Rc::new(f))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// A list of string keys, the dependency slot of a definition.
    pub fn keys<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self::List(keys.into_iter().map(|key| Self::Str(key.into())).collect())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value, widening integers.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether the value is a getter or a setter.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Getter(_) | Self::Setter(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Getter(a), Self::Getter(b)) => Rc::ptr_eq(a, b),
            (Self::Setter(a), Self::Setter(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Getter(_) => f.write_str("Getter(..)"),
            Self::Setter(_) => f.write_str("Setter(..)"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl Shape<String> for Value {
    fn as_sequence(&self) -> Option<&[Self]> {
        self.as_list()
    }

    fn as_getter(&self) -> Option<Getter<String, Self>> {
        match self {
            Self::Getter(getter) => Some(Rc::clone(getter)),
            _ => None,
        }
    }

    fn as_setter(&self) -> Option<Setter<String, Self>> {
        match self {
            Self::Setter(setter) => Some(Rc::clone(setter)),
            _ => None,
        }
    }

    fn as_flag(&self) -> Option<bool> {
        self.as_bool()
    }

    fn as_key(&self) -> Option<String> {
        self.as_str().map(str::to_owned)
    }
}

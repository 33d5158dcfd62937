#![forbid(unsafe_code)]

use std::fmt::Debug;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

/// Failures surfaced by [`Model`](crate::Model) operations.
///
/// Keys are rendered with their `Debug` form so the error type stays
/// independent of the model's key type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("property {key} not found")]
    KeyNotFound { key: String },

    #[error("no setter for dynamic property {key}")]
    NoSetter { key: String },
}

impl ModelError {
    #[must_use]
    pub fn key_not_found<Q: Debug + ?Sized>(key: &Q) -> Self {
        Self::KeyNotFound {
            key: format!("{key:?}"),
        }
    }

    #[must_use]
    pub fn no_setter<Q: Debug + ?Sized>(key: &Q) -> Self {
        Self::NoSetter {
            key: format!("{key:?}"),
        }
    }

    /// The rendered key this error refers to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::KeyNotFound { key } | Self::NoSetter { key } => key,
        }
    }
}

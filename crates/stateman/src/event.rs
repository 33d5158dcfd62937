#![forbid(unsafe_code)]

use std::fmt;

/// Kind of event delivered to global bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// A property was declared (explicitly, or implicitly by `set`).
    New,
    /// A property changed, either directly or through a dependency.
    Changed,
}

impl Event {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Changed => "changed",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#![forbid(unsafe_code)]

//! Behaviour switches for a [`Model`](crate::Model).
//!
//! The defaults keep the historical propagation semantics, including the
//! root-key binding lookup. Each switch opts into the corrected behaviour.

use std::env;

/// Environment variable selecting [`BindingDispatch`] (`root` or `each`).
pub const ENV_BINDING_DISPATCH: &str = "STATEMAN_BINDING_DISPATCH";
/// Environment variable toggling the cycle guard (`1`/`true`/`on`/`yes` or
/// `0`/`false`/`off`/`no`).
pub const ENV_CYCLE_GUARD: &str = "STATEMAN_CYCLE_GUARD";

/// Where per-key bindings are looked up while a change propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingDispatch {
    /// Bindings registered under the changed (root) key fire once for every
    /// affected key. Bindings on dependents never fire.
    #[default]
    RootKey,
    /// Each affected key fires its own bindings.
    EachKey,
}

impl BindingDispatch {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "root" | "root-key" | "root_key" => Some(Self::RootKey),
            "each" | "each-key" | "each_key" => Some(Self::EachKey),
            _ => None,
        }
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Configuration for a [`Model`](crate::Model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelConfig {
    /// Binding lookup strategy during propagation.
    pub binding_dispatch: BindingDispatch,
    /// Skip dependency edges that re-enter a key already on the current walk
    /// path. Off by default: a cyclic graph then recurses without bound.
    pub cycle_guard: bool,
}

impl ModelConfig {
    /// Set the binding lookup strategy.
    #[must_use]
    pub fn with_binding_dispatch(mut self, dispatch: BindingDispatch) -> Self {
        self.binding_dispatch = dispatch;
        self
    }

    /// Enable or disable the cycle guard.
    #[must_use]
    pub fn with_cycle_guard(mut self, enabled: bool) -> Self {
        self.cycle_guard = enabled;
        self
    }

    /// Defaults overridden by `STATEMAN_*` environment variables.
    ///
    /// Unparseable values are ignored with a `config.invalid` warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Defaults overridden by values from `lookup`, keyed by the
    /// environment variable names.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(val) = lookup(ENV_BINDING_DISPATCH) {
            match BindingDispatch::parse(&val) {
                Some(dispatch) => config.binding_dispatch = dispatch,
                None => tracing::warn!(
                    message = "config.invalid",
                    var = ENV_BINDING_DISPATCH,
                    value = %val
                ),
            }
        }
        if let Some(val) = lookup(ENV_CYCLE_GUARD) {
            match parse_switch(&val) {
                Some(enabled) => config.cycle_guard = enabled,
                None => tracing::warn!(
                    message = "config.invalid",
                    var = ENV_CYCLE_GUARD,
                    value = %val
                ),
            }
        }
        config
    }
}

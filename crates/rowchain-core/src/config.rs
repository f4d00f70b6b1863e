//! Chain configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Slice length for batch handlers that did not declare one (0 = whole sequence).
    pub default_batch_size: usize,

    /// Include a compact rendering of each step's output in trace events.
    pub trace_values: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            default_batch_size: 0,
            trace_values: false,
        }
    }
}

impl ChainConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `ROWCHAIN_DEFAULT_BATCH_SIZE`: slice length for undeclared batch sizes
    /// - `ROWCHAIN_TRACE_VALUES`: `true`/`1` to trace step outputs
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok(), false).unwrap_or_default()
    }

    /// Like `from_env`, but an unparseable variable is a `Config` error.
    pub fn try_from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok(), true)
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>, strict: bool) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(s) = get(BATCH_SIZE_VAR) {
            match s.trim().parse::<usize>() {
                Ok(v) => cfg.default_batch_size = v,
                Err(_) if strict => return Err(invalid(BATCH_SIZE_VAR, &s)),
                Err(_) => {}
            }
        }

        if let Some(s) = get(TRACE_VALUES_VAR) {
            match parse_flag(&s) {
                Some(v) => cfg.trace_values = v,
                None if strict => return Err(invalid(TRACE_VALUES_VAR, &s)),
                None => {}
            }
        }

        Ok(cfg)
    }

    pub fn with_default_batch_size(mut self, batch_size: usize) -> Self {
        self.default_batch_size = batch_size;
        self
    }
}

const BATCH_SIZE_VAR: &str = "ROWCHAIN_DEFAULT_BATCH_SIZE";
const TRACE_VALUES_VAR: &str = "ROWCHAIN_TRACE_VALUES";

fn invalid(var: &str, value: &str) -> Error {
    Error::Config(format!("{var}={value:?} cannot be parsed"))
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

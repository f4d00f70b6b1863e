#![forbid(unsafe_code)]
//! rowchain-core: values, node descriptors, configuration, and manifests.
//!
//! No execution happens here. `rowchain-operators` interprets nodes and
//! `rowchain-exec` threads values through a chain of them.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod join;
pub mod manifest;
pub mod node;
pub mod prelude;
pub mod value;

pub use error::{BoxError, Error, Result, StepResult};

/// Crate version recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use serde_json::{json, Value};

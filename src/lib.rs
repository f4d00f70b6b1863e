#![forbid(unsafe_code)]
//! rowchain: declarative, chainable pipelines over in-memory collections.
//!
//! ```
//! use rowchain::{json, start, Compose};
//!
//! let doubled = start(|| Ok(json!([1, 2, 3])))
//!     .map_one(|v| Ok(json!(v.as_i64().unwrap_or(0) * 2)))
//!     .run()
//!     .unwrap();
//! assert_eq!(doubled, json!([2, 4, 6]));
//! ```
//!
//! Chains are built from a producer with [`start`], extended with the
//! [`Compose`] combinators, and executed by an [`Engine`] (or [`Chain::run`]
//! for the environment-configured default).

pub use rowchain_core::config::ChainConfig;
pub use rowchain_core::error::{BoxError, Error, Result, StepResult};
pub use rowchain_core::hash::Hash256;
pub use rowchain_core::join::{key, JoinConfig, JoinConfigBuilder, KeyFn};
pub use rowchain_core::manifest::{RunManifest, StepRecord};
pub use rowchain_core::node::{BatchConfig, Node, Operation};
pub use rowchain_core::{json, Value};

pub use rowchain_exec::{start, Chain, ChainOutput, Compose, Engine, ExecError, Start, Steps};
pub use rowchain_operators::{collect, OpContext, OpError, Operator, Registry};

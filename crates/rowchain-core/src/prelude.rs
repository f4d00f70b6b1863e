//! Convenient re-exports for downstream crates.

pub use crate::config::ChainConfig;
pub use crate::error::{BoxError, Error, Result, StepResult};
pub use crate::id::StepId;
pub use crate::join::{key, JoinConfig, JoinConfigBuilder, KeyFn};
pub use crate::manifest::{ManifestId, RunManifest, StepRecord};
pub use crate::node::{BatchConfig, BatchHandler, Node, NodeSummary, Operation, StepFn};
pub use crate::value::Record;

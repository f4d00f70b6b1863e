#![forbid(unsafe_code)]
//! rowchain-operators: one operator per step operation, plus the dispatch
//! registry that routes a node to its operator.
//!
//! Design intent:
//! - Pure and synchronous; operators own no state between calls.
//! - Every user-function failure surfaces as an `OpError` with context.
//! - Batching (`batch`) and the join index (`join::hash`) are shared helpers,
//!   exposed for callers building custom operators.

pub mod batch;
pub mod collect;
pub mod filter;
pub mod join;
pub mod map;
pub mod merge;
pub mod registry;
pub mod traits;

pub use batch::{batch_process, SliceError};
pub use registry::Registry;
pub use traits::{OpContext, OpError, Operator};

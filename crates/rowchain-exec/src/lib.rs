#![forbid(unsafe_code)]
//! rowchain-exec: chain builder, sequential runtime, and run manifests.
//!
//! A `Chain` is built with `start(..)` and the `Compose` combinators; an
//! `Engine` runs it step by step and reports a `RunManifest` alongside the
//! final value.

pub mod chain;
pub mod metrics;
pub mod runtime;

pub use chain::{start, Chain, Compose, Start, Steps};
pub use runtime::{ChainOutput, Engine, ExecError};

//! Operator trait + common interfaces.
//!
//! The registry takes a node's pending input and hands it to the operator
//! registered for the node's operation. Operators are stateless; everything
//! they need arrives through the node, the input, and the `OpContext`.

use rowchain_core::error::BoxError;
use rowchain_core::node::{BatchHandler, Node, Operation, Producer};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    /// No operator for the node's operation, or the node lacks a function the
    /// operator needs.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// A user function failed.
    #[error("{step} failed: {source}")]
    Processing {
        step: String,
        #[source]
        source: BoxError,
    },

    #[error("join error: {context}")]
    Join {
        context: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl OpError {
    pub fn processing(step: impl Into<String>, source: BoxError) -> Self {
        OpError::Processing {
            step: step.into(),
            source,
        }
    }

    pub fn join(context: impl Into<String>) -> Self {
        OpError::Join {
            context: context.into(),
            source: None,
        }
    }

    pub fn join_caused(context: impl Into<String>, source: BoxError) -> Self {
        OpError::Join {
            context: context.into(),
            source: Some(source),
        }
    }
}

/// Engine-wide settings operators may consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpContext {
    /// Slice length for batch handlers without a declared size (0 = whole).
    pub default_batch_size: usize,
}

/// Trait that all step operators implement.
///
/// Invariants:
/// - `eval` must not retain the input; ownership of the output passes to the caller.
/// - User-function failures are wrapped, never swallowed.
pub trait Operator: Send + Sync + 'static {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    /// Run the operation for one node against its (already taken) input.
    fn eval(&self, node: &Node, input: Value, ctx: &OpContext) -> Result<Value, OpError>;
}

/// The node's producer, or a dispatch error naming the operation.
pub(crate) fn require_producer(node: &Node) -> Result<&Producer, OpError> {
    node.primary()
        .and_then(|f| f.as_producer())
        .ok_or_else(|| missing_function(node.operation(), "producer"))
}

/// The node's batch handler, or a dispatch error naming the operation.
pub(crate) fn require_batch(node: &Node) -> Result<&BatchHandler, OpError> {
    node.primary()
        .and_then(|f| f.as_batch())
        .ok_or_else(|| missing_function(node.operation(), "batch handler"))
}

pub(crate) fn missing_function(op: Operation, wanted: &str) -> OpError {
    OpError::Dispatch(format!("{op} step requires a {wanted}"))
}

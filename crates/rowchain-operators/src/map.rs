//! Map operators: per item (`map_one`) and per batch (`map_batch`).

use rowchain_core::node::Node;
use serde_json::Value;

use crate::batch::batch_process;
use crate::traits::{missing_function, require_batch, OpContext, OpError, Operator};

/// Applies the node's mapper to every element of a sequence, or once to any
/// other input. Always yields a sequence.
#[derive(Debug, Default)]
pub struct MapOne;

impl Operator for MapOne {
    fn name(&self) -> &'static str {
        "map_one"
    }

    fn eval(&self, node: &Node, input: Value, _ctx: &OpContext) -> Result<Value, OpError> {
        let mapper = node
            .primary()
            .and_then(|f| f.as_mapper())
            .ok_or_else(|| missing_function(node.operation(), "mapper"))?;
        let step = node.operation().intent();

        // Absent input maps the null placeholder, like any other single value.
        let out = match input {
            Value::Array(items) => items
                .into_iter()
                .map(|item| mapper(item))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| OpError::processing(step, e))?,
            single => vec![mapper(single).map_err(|e| OpError::processing(step, e))?],
        };
        Ok(Value::Array(out))
    }
}

/// Hands sequences to the node's batch handler (sliced per its batch size);
/// any other input is passed to the handler as-is.
#[derive(Debug, Default)]
pub struct MapBatch;

impl Operator for MapBatch {
    fn name(&self) -> &'static str {
        "map_batch"
    }

    fn eval(&self, node: &Node, input: Value, ctx: &OpContext) -> Result<Value, OpError> {
        let handler = require_batch(node)?;
        let step = node.operation().intent();
        let out = match input {
            Value::Array(items) => batch_process(items, handler, ctx, false),
            other => handler.call(other),
        };
        out.map_err(|e| OpError::processing(step, e))
    }
}

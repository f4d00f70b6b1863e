//! Filter operator: keep sequence items the predicate accepts.
//!
//! Only sequences are filtered. A single non-null value is not treated as a
//! one-element collection and yields an empty sequence, as does null.

use rowchain_core::node::Node;
use serde_json::Value;

use crate::traits::{missing_function, OpContext, OpError, Operator};

#[derive(Debug, Default)]
pub struct Filter;

impl Operator for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn eval(&self, node: &Node, input: Value, _ctx: &OpContext) -> Result<Value, OpError> {
        let predicate = node
            .primary()
            .and_then(|f| f.as_predicate())
            .ok_or_else(|| missing_function(node.operation(), "predicate"))?;

        let Value::Array(items) = input else {
            return Ok(Value::Array(Vec::new()));
        };

        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            let keep = predicate(&item)
                .map_err(|e| OpError::processing(node.operation().intent(), e))?;
            if keep {
                kept.push(item);
            }
        }
        Ok(Value::Array(kept))
    }
}

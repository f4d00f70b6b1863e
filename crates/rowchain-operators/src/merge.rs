//! Initialize and merge: the two operators driven by a zero-argument producer.

use rowchain_core::node::Node;
use rowchain_core::value::wrap;
use serde_json::Value;

use crate::traits::{require_producer, OpContext, OpError, Operator};

/// Calls the producer and returns its result verbatim; ignores the input.
#[derive(Debug, Default)]
pub struct Initialize;

impl Operator for Initialize {
    fn name(&self) -> &'static str {
        "initialize"
    }

    fn eval(&self, node: &Node, _input: Value, _ctx: &OpContext) -> Result<Value, OpError> {
        let producer = require_producer(node)?;
        producer().map_err(|e| OpError::processing(node.operation().intent(), e))
    }
}

/// Appends freshly produced data after the input.
///
/// The produced value is wrapped into a sequence when it is not one. An absent
/// input yields just the produced sequence; a scalar input is prepended.
#[derive(Debug, Default)]
pub struct Merge;

impl Operator for Merge {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn eval(&self, node: &Node, input: Value, _ctx: &OpContext) -> Result<Value, OpError> {
        let producer = require_producer(node)?;
        let appendage =
            wrap(producer().map_err(|e| OpError::processing(node.operation().intent(), e))?);

        let merged = match input {
            Value::Null => appendage,
            Value::Array(mut items) => {
                items.extend(appendage);
                items
            }
            single => {
                let mut items = Vec::with_capacity(appendage.len() + 1);
                items.push(single);
                items.extend(appendage);
                items
            }
        };
        Ok(Value::Array(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initialize_returns_producer_result_verbatim() {
        let node = Node::initialize(|| Ok(json!({"not": "a list"})));
        let out = Initialize
            .eval(&node, Value::Null, &OpContext::default())
            .unwrap();
        assert_eq!(out, json!({"not": "a list"}));
    }

    #[test]
    fn initialize_failure_is_wrapped() {
        let node = Node::initialize(|| Err("no source".into()));
        let err = Initialize
            .eval(&node, Value::Null, &OpContext::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "initializer failed: no source");
    }

    #[test]
    fn merge_absent_input_with_scalar_producer() {
        let node = Node::merge(|| Ok(json!(5)));
        let out = Merge.eval(&node, Value::Null, &OpContext::default()).unwrap();
        assert_eq!(out, json!([5]));
    }

    #[test]
    fn merge_appends_after_sequence_input() {
        let node = Node::merge(|| Ok(json!([3, 4])));
        let out = Merge
            .eval(&node, json!([1, 2]), &OpContext::default())
            .unwrap();
        assert_eq!(out, json!([1, 2, 3, 4]));
    }

    #[test]
    fn merge_prepends_scalar_input() {
        let node = Node::merge(|| Ok(json!([2, 3])));
        let out = Merge.eval(&node, json!(1), &OpContext::default()).unwrap();
        assert_eq!(out, json!([1, 2, 3]));

        let node = Node::merge(|| Ok(json!("b")));
        let out = Merge.eval(&node, json!("a"), &OpContext::default()).unwrap();
        assert_eq!(out, json!(["a", "b"]));
    }

    #[test]
    fn merge_producer_failure_is_wrapped() {
        let node = Node::merge(|| Err("offline".into()));
        let err = Merge
            .eval(&node, json!([1]), &OpContext::default())
            .unwrap_err();
        assert!(matches!(err, OpError::Processing { .. }));
    }
}

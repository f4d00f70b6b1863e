//! Operation -> operator dispatch table.
//!
//! The engine owns one `Registry`; there is no process-wide instance. A
//! registry built with `new()` covers every operation with an algorithm.
//! `Prepare` has none and stays unregistered, so dispatching a bare prepared
//! node is a dispatch error.

use std::collections::HashMap;

use rowchain_core::node::{Node, Operation};
use serde_json::Value;

use crate::filter::Filter;
use crate::join::{FullJoin, LeftJoin};
use crate::map::{MapBatch, MapOne};
use crate::merge::{Initialize, Merge};
use crate::traits::{OpContext, OpError, Operator};

pub struct Registry {
    ops: HashMap<Operation, Box<dyn Operator>>,
}

impl Registry {
    pub fn new() -> Self {
        let mut r = Self::empty();
        r.register(Operation::Initialize, Box::new(Initialize));
        r.register(Operation::MapOne, Box::new(MapOne));
        r.register(Operation::MapBatch, Box::new(MapBatch));
        r.register(Operation::Filter, Box::new(Filter));
        r.register(Operation::Merge, Box::new(Merge));
        r.register(Operation::LeftJoin, Box::new(LeftJoin));
        r.register(Operation::FullJoin, Box::new(FullJoin));
        r
    }

    pub fn empty() -> Self {
        Self {
            ops: HashMap::new(),
        }
    }

    /// Install (or replace) the operator for `op`.
    pub fn register(&mut self, op: Operation, operator: Box<dyn Operator>) {
        self.ops.insert(op, operator);
    }

    pub fn get(&self, op: Operation) -> Option<&dyn Operator> {
        self.ops.get(&op).map(|b| b.as_ref())
    }

    pub fn contains(&self, op: Operation) -> bool {
        self.ops.contains_key(&op)
    }

    /// Consume the node's pending input and run its operation.
    ///
    /// The slot is cleared before dispatch, so it is empty afterwards whether
    /// the operator succeeds or fails. A missing input is treated as null.
    pub fn process(&self, node: &mut Node, ctx: &OpContext) -> Result<Value, OpError> {
        let input = node.take_input().unwrap_or(Value::Null);
        let op = node.operation();
        let operator = self.get(op).ok_or_else(|| {
            OpError::Dispatch(format!("no operator registered for operation '{op}'"))
        })?;

        #[cfg(feature = "tracing")]
        tracing::trace!(operation = %op, operator = operator.name(), "dispatching step");

        operator.eval(node, input, ctx)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_operation_but_prepare_is_registered() {
        let r = Registry::new();
        for op in [
            Operation::Initialize,
            Operation::MapOne,
            Operation::MapBatch,
            Operation::Filter,
            Operation::Merge,
            Operation::LeftJoin,
            Operation::FullJoin,
        ] {
            assert!(r.contains(op), "{op} missing");
            assert_eq!(r.get(op).map(|o| o.name()), Some(op.as_str()));
        }
        assert!(!r.contains(Operation::Prepare));
    }

    #[test]
    fn process_consumes_pending_input() {
        let r = Registry::new();
        let mut node = Node::map_one(|v: serde_json::Value| Ok(json!(v.as_i64().unwrap_or(0) * 10)));
        node.set_input(json!([1, 2]));
        let out = r.process(&mut node, &OpContext::default()).unwrap();
        assert_eq!(out, json!([10, 20]));
        assert!(!node.has_pending_input());
    }

    #[test]
    fn prepare_is_a_dispatch_error_and_clears_input() {
        let r = Registry::new();
        let mut node = Node::prepare(Ok);
        node.set_input(json!([{"id": 1}]));
        let err = r.process(&mut node, &OpContext::default()).unwrap_err();
        assert!(matches!(err, OpError::Dispatch(_)));
        assert!(err.to_string().contains("'prepare'"));
        assert!(!node.has_pending_input());
    }

    #[test]
    fn failing_operator_still_clears_input() {
        let r = Registry::new();
        let mut node = Node::filter(|_| Err("nope".into()));
        node.set_input(json!([1]));
        assert!(r.process(&mut node, &OpContext::default()).is_err());
        assert!(!node.has_pending_input());
    }

    #[test]
    fn custom_operator_can_be_registered() {
        struct Echo;
        impl Operator for Echo {
            fn name(&self) -> &'static str {
                "echo"
            }
            fn eval(&self, _node: &Node, input: Value, _ctx: &OpContext) -> Result<Value, OpError> {
                Ok(input)
            }
        }

        let mut r = Registry::empty();
        r.register(Operation::Prepare, Box::new(Echo));
        let mut node = Node::prepare(Ok);
        node.set_input(json!("x"));
        assert_eq!(r.process(&mut node, &OpContext::default()).unwrap(), json!("x"));
    }
}

//! Chain-node descriptors: what a pipeline step does and with which functions.
//!
//! A `Node` is built by one of the combinator constructors and is never
//! re-tagged afterwards; the join combinators consume the prepared node and
//! return a new one. The `pending` slot is the only mutable part and is owned
//! by the runtime: written right before dispatch, taken by the registry.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StepResult;
use crate::join::JoinConfig;

/// Zero-argument data producer (initialize, merge).
pub type Producer = Arc<dyn Fn() -> StepResult + Send + Sync>;

/// Value-to-value function (per item for map_one, per slice for batches).
pub type Mapper = Arc<dyn Fn(Value) -> StepResult + Send + Sync>;

/// Filter predicate.
pub type Predicate = Arc<dyn Fn(&Value) -> StepResult<bool> + Send + Sync>;

/// Closed set of step operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Initialize,
    /// Reserved: a fetcher waiting for a join configuration. No algorithm.
    Prepare,
    MapOne,
    MapBatch,
    Filter,
    Merge,
    LeftJoin,
    FullJoin,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Initialize => "initialize",
            Operation::Prepare => "prepare",
            Operation::MapOne => "map_one",
            Operation::MapBatch => "map_batch",
            Operation::Filter => "filter",
            Operation::Merge => "merge",
            Operation::LeftJoin => "left_join",
            Operation::FullJoin => "full_join",
        }
    }

    /// What the step's user function is for; used in error messages.
    pub fn intent(&self) -> &'static str {
        match self {
            Operation::Initialize => "initializer",
            Operation::Prepare => "join fetcher",
            Operation::MapOne => "single-item mapper",
            Operation::MapBatch => "batch handler",
            Operation::Filter => "filter predicate",
            Operation::Merge => "merge producer",
            Operation::LeftJoin => "left join",
            Operation::FullJoin => "full join",
        }
    }

    pub fn is_join(&self) -> bool {
        matches!(self, Operation::LeftJoin | Operation::FullJoin)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch slicing declared alongside a batch handler.
///
/// `None` means "not declared": the engine default applies. `Some(0)` pins the
/// whole sequence in one call regardless of the engine default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub batch_size: Option<usize>,
}

impl BatchConfig {
    pub const fn sized(batch_size: usize) -> Self {
        Self {
            batch_size: Some(batch_size),
        }
    }

    pub const fn whole() -> Self {
        Self {
            batch_size: Some(0),
        }
    }

    /// Effective slice length (0 = whole sequence).
    pub fn resolve(&self, default_batch_size: usize) -> usize {
        self.batch_size.unwrap_or(default_batch_size)
    }
}

/// A batch function plus its slicing configuration.
#[derive(Clone)]
pub struct BatchHandler {
    func: Mapper,
    pub config: BatchConfig,
}

impl BatchHandler {
    pub fn new(func: Mapper, config: BatchConfig) -> Self {
        Self { func, config }
    }

    pub fn call(&self, input: Value) -> StepResult {
        (self.func)(input)
    }
}

/// The primary user function of a node.
#[derive(Clone)]
pub enum StepFn {
    Producer(Producer),
    Mapper(Mapper),
    Batch(BatchHandler),
    Predicate(Predicate),
}

impl StepFn {
    pub fn kind(&self) -> &'static str {
        match self {
            StepFn::Producer(_) => "producer",
            StepFn::Mapper(_) => "mapper",
            StepFn::Batch(_) => "batch",
            StepFn::Predicate(_) => "predicate",
        }
    }

    pub fn as_producer(&self) -> Option<&Producer> {
        match self {
            StepFn::Producer(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_mapper(&self) -> Option<&Mapper> {
        match self {
            StepFn::Mapper(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_batch(&self) -> Option<&BatchHandler> {
        match self {
            StepFn::Batch(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_predicate(&self) -> Option<&Predicate> {
        match self {
            StepFn::Predicate(f) => Some(f),
            _ => None,
        }
    }
}

/// One pipeline step.
#[derive(Clone)]
pub struct Node {
    operation: Operation,
    primary: Option<StepFn>,
    join: Option<JoinConfig>,
    pending: Option<Value>,
}

impl Node {
    /// Assemble a node from raw parts. Prefer the typed constructors; this is
    /// for custom operators registered on a non-default registry.
    pub fn from_parts(
        operation: Operation,
        primary: Option<StepFn>,
        join: Option<JoinConfig>,
    ) -> Self {
        Self {
            operation,
            primary,
            join,
            pending: None,
        }
    }

    pub fn initialize<F>(producer: F) -> Self
    where
        F: Fn() -> StepResult + Send + Sync + 'static,
    {
        Self::from_parts(
            Operation::Initialize,
            Some(StepFn::Producer(Arc::new(producer))),
            None,
        )
    }

    /// Right-side fetcher for a join; complete with `left_join` / `full_join`.
    pub fn prepare<F>(fetcher: F) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        Self::prepare_with(fetcher, BatchConfig::default())
    }

    pub fn prepare_with<F>(fetcher: F, config: BatchConfig) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        Self::from_parts(
            Operation::Prepare,
            Some(StepFn::Batch(BatchHandler::new(Arc::new(fetcher), config))),
            None,
        )
    }

    pub fn merge<F>(producer: F) -> Self
    where
        F: Fn() -> StepResult + Send + Sync + 'static,
    {
        Self::from_parts(
            Operation::Merge,
            Some(StepFn::Producer(Arc::new(producer))),
            None,
        )
    }

    pub fn filter<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> StepResult<bool> + Send + Sync + 'static,
    {
        Self::from_parts(
            Operation::Filter,
            Some(StepFn::Predicate(Arc::new(predicate))),
            None,
        )
    }

    pub fn map_one<F>(mapper: F) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        Self::from_parts(
            Operation::MapOne,
            Some(StepFn::Mapper(Arc::new(mapper))),
            None,
        )
    }

    pub fn map_batch<F>(handler: F) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        Self::map_batch_with(handler, BatchConfig::default())
    }

    pub fn map_batch_with<F>(handler: F, config: BatchConfig) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        Self::from_parts(
            Operation::MapBatch,
            Some(StepFn::Batch(BatchHandler::new(Arc::new(handler), config))),
            None,
        )
    }

    /// Attach a join configuration; the node's fetcher becomes the right side.
    pub fn left_join(self, config: JoinConfig) -> Self {
        self.into_join(Operation::LeftJoin, config)
    }

    pub fn full_join(self, config: JoinConfig) -> Self {
        self.into_join(Operation::FullJoin, config)
    }

    fn into_join(self, operation: Operation, config: JoinConfig) -> Self {
        Self {
            operation,
            primary: self.primary,
            join: Some(config),
            pending: None,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn primary(&self) -> Option<&StepFn> {
        self.primary.as_ref()
    }

    pub fn join_config(&self) -> Option<&JoinConfig> {
        self.join.as_ref()
    }

    /// Write the value the next dispatch will consume.
    pub fn set_input(&mut self, input: Value) {
        self.pending = Some(input);
    }

    /// Take the pending input, leaving the slot empty.
    pub fn take_input(&mut self) -> Option<Value> {
        self.pending.take()
    }

    pub fn has_pending_input(&self) -> bool {
        self.pending.is_some()
    }

    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            operation: self.operation,
            function: self.primary.as_ref().map(|f| f.kind().to_string()),
            batch_size: self
                .primary
                .as_ref()
                .and_then(StepFn::as_batch)
                .and_then(|h| h.config.batch_size),
            left_property: self
                .join
                .as_ref()
                .and_then(|j| j.left_property().map(str::to_string)),
            one_to_many: self.join.as_ref().map(JoinConfig::one_to_many),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("operation", &self.operation)
            .field("primary", &self.primary.as_ref().map(StepFn::kind))
            .field("join", &self.join)
            .field("pending", &self.pending)
            .finish()
    }
}

/// Serializable shape of a node (no closures), for fingerprints and manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub operation: Operation,
    pub function: Option<String>,
    pub batch_size: Option<usize>,
    pub left_property: Option<String>,
    pub one_to_many: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::{key, JoinConfig};
    use serde_json::json;

    #[test]
    fn constructors_tag_operations() {
        assert_eq!(
            Node::initialize(|| Ok(json!([]))).operation(),
            Operation::Initialize
        );
        assert_eq!(Node::merge(|| Ok(json!(1))).operation(), Operation::Merge);
        assert_eq!(Node::filter(|_| Ok(true)).operation(), Operation::Filter);
        assert_eq!(Node::map_one(Ok).operation(), Operation::MapOne);
        assert_eq!(Node::map_batch(Ok).operation(), Operation::MapBatch);
        assert_eq!(Node::prepare(Ok).operation(), Operation::Prepare);
    }

    #[test]
    fn join_combinators_return_new_node_with_fetcher() {
        let cfg = JoinConfig::builder()
            .left_key(key::field("id"))
            .right_key(key::field("uid"))
            .one_to_many(false)
            .build()
            .unwrap();

        let prepared = Node::prepare_with(Ok, BatchConfig::sized(2));
        let joined = prepared.clone().left_join(cfg.clone());
        assert_eq!(prepared.operation(), Operation::Prepare);
        assert_eq!(joined.operation(), Operation::LeftJoin);
        assert!(joined.join_config().is_some());
        assert_eq!(
            joined.primary().and_then(StepFn::as_batch).map(|h| h.config),
            Some(BatchConfig::sized(2))
        );

        let full = prepared.full_join(cfg);
        assert_eq!(full.operation(), Operation::FullJoin);
    }

    #[test]
    fn pending_input_is_taken_once() {
        let mut node = Node::map_one(Ok);
        assert!(!node.has_pending_input());
        node.set_input(json!([1, 2]));
        assert!(node.has_pending_input());
        assert_eq!(node.take_input(), Some(json!([1, 2])));
        assert_eq!(node.take_input(), None);
    }

    #[test]
    fn batch_config_resolution() {
        assert_eq!(BatchConfig::default().resolve(7), 7);
        assert_eq!(BatchConfig::whole().resolve(7), 0);
        assert_eq!(BatchConfig::sized(3).resolve(7), 3);
    }

    #[test]
    fn summary_serializes_without_closures() {
        let node = Node::map_batch_with(Ok, BatchConfig::sized(4));
        let summary = node.summary();
        assert_eq!(summary.operation, Operation::MapBatch);
        assert_eq!(summary.batch_size, Some(4));
        let encoded = serde_json::to_value(&summary).unwrap();
        assert_eq!(encoded["operation"], json!("map_batch"));
        assert_eq!(encoded["function"], json!("batch"));
    }
}

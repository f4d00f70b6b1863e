//! Chain building: `start` a chain from a producer, then append steps.
//!
//! `Chain` always begins with its `Initialize` node. `Steps` is the headless
//! variant: a reusable run of steps with no initializer, appended to a chain
//! (or to other steps) with `extend`. Both share the combinators of
//! `Compose`.

use serde_json::Value;

use rowchain_core::config::ChainConfig;
use rowchain_core::error::StepResult;
use rowchain_core::hash::{hash_serde, Hash256};
use rowchain_core::join::JoinConfig;
use rowchain_core::node::{BatchConfig, Node, NodeSummary};

use crate::runtime::{ChainOutput, Engine, ExecError};

/// Combinators shared by `Chain` and `Steps`. Every method consumes the
/// receiver and returns it with one more node appended.
pub trait Compose: Sized {
    /// Append one node.
    fn then(self, node: Node) -> Self;

    /// Append a whole sub-chain, in order.
    fn extend(self, steps: Steps) -> Self {
        steps.into_nodes().into_iter().fold(self, Self::then)
    }

    fn map_one<F>(self, mapper: F) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        self.then(Node::map_one(mapper))
    }

    fn map_batch<F>(self, handler: F) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        self.then(Node::map_batch(handler))
    }

    fn map_batch_sized<F>(self, handler: F, batch_size: usize) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        self.then(Node::map_batch_with(handler, BatchConfig::sized(batch_size)))
    }

    fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&Value) -> StepResult<bool> + Send + Sync + 'static,
    {
        self.then(Node::filter(predicate))
    }

    fn merge<F>(self, producer: F) -> Self
    where
        F: Fn() -> StepResult + Send + Sync + 'static,
    {
        self.then(Node::merge(producer))
    }

    fn left_join<F>(self, fetcher: F, config: JoinConfig) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        self.then(Node::prepare(fetcher).left_join(config))
    }

    fn left_join_sized<F>(self, fetcher: F, batch_size: usize, config: JoinConfig) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        self.then(Node::prepare_with(fetcher, BatchConfig::sized(batch_size)).left_join(config))
    }

    fn full_join<F>(self, fetcher: F, config: JoinConfig) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        self.then(Node::prepare(fetcher).full_join(config))
    }

    fn full_join_sized<F>(self, fetcher: F, batch_size: usize, config: JoinConfig) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        self.then(Node::prepare_with(fetcher, BatchConfig::sized(batch_size)).full_join(config))
    }
}

/// A runnable pipeline. Only `start` / `Start::with` create one.
#[derive(Debug, Clone)]
pub struct Chain {
    nodes: Vec<Node>,
}

impl Chain {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a chain holds at least its initializer.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn summaries(&self) -> Vec<NodeSummary> {
        self.nodes.iter().map(Node::summary).collect()
    }

    /// Stable hash of the chain shape. User functions are not part of it.
    pub fn fingerprint(&self) -> rowchain_core::Result<Hash256> {
        hash_serde(&self.summaries())
    }

    /// Run with the default engine and return the final value.
    ///
    /// Batch handlers without a declared size see the whole sequence. Use
    /// `run_with` to supply an engine built from other settings.
    pub fn run(&self) -> Result<Value, ExecError> {
        Engine::new(ChainConfig::default())
            .run(self)
            .map(|out| out.value)
    }

    pub fn run_with(&self, engine: &Engine) -> Result<ChainOutput, ExecError> {
        engine.run(self)
    }
}

impl Compose for Chain {
    fn then(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }
}

/// Steps without an initializer, for reuse across chains.
#[derive(Debug, Clone, Default)]
pub struct Steps {
    nodes: Vec<Node>,
}

impl Steps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Compose for Steps {
    fn then(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }
}

/// Entry point for building chains.
pub struct Start;

impl Start {
    pub fn with<F>(producer: F) -> Chain
    where
        F: Fn() -> StepResult + Send + Sync + 'static,
    {
        Chain {
            nodes: vec![Node::initialize(producer)],
        }
    }
}

/// Begin a chain whose first step calls `producer`.
pub fn start<F>(producer: F) -> Chain
where
    F: Fn() -> StepResult + Send + Sync + 'static,
{
    Start::with(producer)
}

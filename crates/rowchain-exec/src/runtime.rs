//! Runtime: thread a value through a chain's nodes and emit a RunManifest.
//!
//! - The `Engine` owns the chain configuration and the operator registry.
//! - Each run clones the chain's nodes, so a chain can be run repeatedly.
//! - Steps run strictly in order; the first failure aborts the run.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use rowchain_core::config::ChainConfig;
use rowchain_core::hash::hash_serde;
use rowchain_core::id::StepId;
use rowchain_core::manifest::{RunManifest, StepRecord};
use rowchain_core::node::{Node, Operation};
use rowchain_core::value::row_count;

use rowchain_operators::registry::Registry;
use rowchain_operators::traits::{OpContext, OpError};

use crate::chain::Chain;
use crate::metrics::emit_span;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("step {index} ({operation}) failed: {source}")]
    Step {
        index: usize,
        operation: Operation,
        #[source]
        source: OpError,
    },
    #[error("hashing error: {0}")]
    Hash(String),
}

impl ExecError {
    /// The operator error behind a step failure.
    pub fn op_error(&self) -> Option<&OpError> {
        match self {
            ExecError::Step { source, .. } => Some(source),
            ExecError::Hash(_) => None,
        }
    }
}

/// Final value of a run plus what happened along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainOutput {
    pub value: Value,
    pub manifest: RunManifest,
}

pub struct Engine {
    cfg: ChainConfig,
    registry: Registry,
}

impl Engine {
    pub fn new(cfg: ChainConfig) -> Self {
        Self::with_registry(cfg, Registry::new())
    }

    /// Use a custom dispatch table.
    pub fn with_registry(cfg: ChainConfig, registry: Registry) -> Self {
        Self { cfg, registry }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn context(&self) -> OpContext {
        OpContext {
            default_batch_size: self.cfg.default_batch_size,
        }
    }

    /// Dispatch one node against its pending input.
    pub fn process(&self, node: &mut Node) -> Result<Value, OpError> {
        self.registry.process(node, &self.context())
    }

    /// Execute `chain` from its initializer to the last step.
    pub fn run(&self, chain: &Chain) -> Result<ChainOutput, ExecError> {
        let plan_hash = chain
            .fingerprint()
            .map_err(|e| ExecError::Hash(e.to_string()))?;
        let mut manifest = RunManifest::new(plan_hash, now_millis());
        let ctx = self.context();

        let mut value = Value::Null;
        for (index, mut node) in chain.nodes().iter().cloned().enumerate() {
            let operation = node.operation();
            // The initializer runs with no prior input.
            let input_rows = if index == 0 {
                None
            } else {
                let input = std::mem::take(&mut value);
                let rows = row_count(&input);
                node.set_input(input);
                rows
            };

            let started = Instant::now();
            value = self
                .registry
                .process(&mut node, &ctx)
                .map_err(|source| ExecError::Step {
                    index,
                    operation,
                    source,
                })?;
            let elapsed_us = started.elapsed().as_micros() as u64;
            let output_rows = row_count(&value);

            manifest.record(StepRecord {
                step: StepId::new(index as u64),
                operation,
                input_rows,
                output_rows,
                elapsed_us,
            });

            #[cfg(feature = "tracing")]
            {
                if self.cfg.trace_values {
                    let rendered = rowchain_core::value::preview(&value, 200);
                    tracing::trace!(step = index, op = %operation, ?input_rows, ?output_rows, elapsed_us, value = %rendered, "executed step");
                } else {
                    tracing::trace!(step = index, op = %operation, ?input_rows, ?output_rows, elapsed_us, "executed step");
                }
            }

            emit_span(
                "step",
                &[
                    ("index", &index),
                    ("operation", &operation),
                    ("elapsed_us", &elapsed_us),
                ],
            );
        }

        let digest = hash_serde(&value).map_err(|e| ExecError::Hash(e.to_string()))?;
        let manifest = manifest.finish(now_millis(), Some(digest));

        #[cfg(feature = "tracing")]
        tracing::debug!(run = %manifest.id, plan = %manifest.plan_hash, steps = manifest.steps.len(), elapsed_ms = manifest.elapsed_ms(), "chain finished");

        Ok(ChainOutput { value, manifest })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

// --- helpers ---

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

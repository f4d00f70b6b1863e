//! Run manifest: what a chain execution did, step by step.
//!
//! The engine emits one manifest per successful run. Two runs of chains with
//! the same shape share a `plan_hash`; identical outputs share an
//! `output_digest`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;
use crate::id::StepId;
use crate::node::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

impl std::fmt::Display for ManifestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: StepId,
    pub operation: Operation,
    /// Row counts are `None` when the value was not a sequence.
    pub input_rows: Option<usize>,
    pub output_rows: Option<usize>,
    pub elapsed_us: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the chain shape (operations and their settings).
    pub plan_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    pub steps: Vec<StepRecord>,

    /// Digest of the final value.
    pub output_digest: Option<Hash256>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(plan_hash: Hash256, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            plan_hash,
            engine_version: crate::VERSION.to_string(),
            steps: Vec::new(),
            output_digest: None,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn record(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    pub fn finish(mut self, finished_ms: u64, output_digest: Option<Hash256>) -> Self {
        self.finished_ms = finished_ms;
        self.output_digest = output_digest;
        self
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}

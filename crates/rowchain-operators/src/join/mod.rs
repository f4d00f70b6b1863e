//! Left and full joins against rows fetched for the current input.
//!
//! The node's batch handler is the right-side fetcher: it receives the left
//! rows (sliced per its batch size) and returns the rows to join against.

pub mod hash;
pub mod merge;

use rowchain_core::join::JoinConfig;
use rowchain_core::node::{BatchHandler, Node};
use rowchain_core::value::into_rows;
use serde_json::Value;

use crate::batch::batch_process;
use crate::traits::{OpContext, OpError, Operator};
use hash::KeyIndex;
use merge::merge_rows;

/// Keeps every left row; unmatched right rows are ignored.
#[derive(Debug, Default)]
pub struct LeftJoin;

impl Operator for LeftJoin {
    fn name(&self) -> &'static str {
        "left_join"
    }

    fn eval(&self, node: &Node, input: Value, ctx: &OpContext) -> Result<Value, OpError> {
        let (cfg, fetcher) = join_parts(node)?;
        let left = into_rows(input);
        if left.is_empty() {
            return Ok(Value::Array(left));
        }

        let right = fetch_right(&left, fetcher, ctx)?;
        if right.is_empty() {
            return Ok(Value::Array(left));
        }

        let index = build_index(right, cfg)?;
        let outcome = merge_rows(left, &index, cfg)?;
        Ok(Value::Array(outcome.rows))
    }
}

/// Left join plus every right row whose key no left row produced.
#[derive(Debug, Default)]
pub struct FullJoin;

impl Operator for FullJoin {
    fn name(&self) -> &'static str {
        "full_join"
    }

    fn eval(&self, node: &Node, input: Value, ctx: &OpContext) -> Result<Value, OpError> {
        let (cfg, fetcher) = join_parts(node)?;
        let left = into_rows(input);

        // The fetcher runs even for an empty left side: right-only rows still count.
        let right = fetch_right(&left, fetcher, ctx)?;
        if right.is_empty() {
            return Ok(Value::Array(left));
        }

        let index = build_index(right, cfg)?;
        let outcome = merge_rows(left, &index, cfg)?;
        let mut rows = outcome.rows;

        #[cfg(feature = "tracing")]
        let joined = rows.len();
        for (key, matched) in index.into_entries() {
            if !outcome.left_keys.contains(&key) {
                rows.extend(matched.into_rows());
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(rows = rows.len(), unmatched = rows.len() - joined, "full join appended right-only rows");

        Ok(Value::Array(rows))
    }
}

fn join_parts(node: &Node) -> Result<(&JoinConfig, &BatchHandler), OpError> {
    let op = node.operation();
    let cfg = node
        .join_config()
        .ok_or_else(|| OpError::join(format!("{op} step has no join configuration")))?;
    let fetcher = node
        .primary()
        .and_then(|f| f.as_batch())
        .ok_or_else(|| OpError::join(format!("{op} step has no right-side fetcher")))?;
    Ok((cfg, fetcher))
}

fn fetch_right(
    left: &[Value],
    fetcher: &BatchHandler,
    ctx: &OpContext,
) -> Result<Vec<Value>, OpError> {
    let fetched = batch_process(left.to_vec(), fetcher, ctx, true)
        .map_err(|e| OpError::join_caused("right-side fetch failed", e))?;
    Ok(into_rows(fetched))
}

fn build_index(right: Vec<Value>, cfg: &JoinConfig) -> Result<KeyIndex, OpError> {
    let index = KeyIndex::build(right, cfg.one_to_many(), |row| cfg.right_key(row))
        .map_err(|(pos, e)| OpError::join_caused(format!("right key of row {pos}"), e))?;

    #[cfg(feature = "tracing")]
    tracing::trace!(keys = index.len(), one_to_many = cfg.one_to_many(), "built right-side index");

    Ok(index)
}

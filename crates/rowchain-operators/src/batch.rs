//! Batching: feed a sequence to a batch handler in fixed-size slices.
//!
//! Slices are consecutive and non-overlapping, called strictly in input order,
//! and their results are flattened back in that same order.

use rowchain_core::error::{BoxError, StepResult};
use rowchain_core::node::BatchHandler;
use serde_json::Value;
use thiserror::Error;

use crate::traits::OpContext;

/// Failure of one slice; `slice` is 1-based.
#[derive(Debug, Error)]
#[error("slice {slice} of {slices}: {source}")]
pub struct SliceError {
    pub slice: usize,
    pub slices: usize,
    #[source]
    pub source: BoxError,
}

/// Run `handler` over `items`.
///
/// With an effective batch size of 0 the handler is called once with the whole
/// sequence. Its result is returned unchanged unless `wrap_result` is set, in
/// which case non-array results are normalized to arrays (`null` -> `[]`,
/// scalar -> `[scalar]`).
///
/// With a batch size `n > 0` the handler is called once per slice of `n`
/// items; array results are concatenated, scalar results appended and `null`
/// results dropped. The result is always an array.
pub fn batch_process(
    items: Vec<Value>,
    handler: &BatchHandler,
    ctx: &OpContext,
    wrap_result: bool,
) -> StepResult {
    let size = handler.config.resolve(ctx.default_batch_size);
    if size == 0 {
        let out = handler.call(Value::Array(items))?;
        return Ok(if wrap_result { wrap_whole(out) } else { out });
    }

    let total = items.len();
    let slices = total.div_ceil(size);

    #[cfg(feature = "tracing")]
    tracing::trace!(rows = total, batch_size = size, slices, "slicing sequence");

    let mut out = Vec::with_capacity(total);
    let mut rest = items.into_iter();
    for slice in 0..slices {
        let chunk: Vec<Value> = rest.by_ref().take(size).collect();
        let result = handler.call(Value::Array(chunk)).map_err(|source| -> BoxError {
            Box::new(SliceError {
                slice: slice + 1,
                slices,
                source,
            })
        })?;
        match result {
            Value::Null => {}
            Value::Array(values) => out.extend(values),
            other => out.push(other),
        }
    }
    Ok(Value::Array(out))
}

fn wrap_whole(out: Value) -> Value {
    match out {
        Value::Array(_) => out,
        Value::Null => Value::Array(Vec::new()),
        other => Value::Array(vec![other]),
    }
}

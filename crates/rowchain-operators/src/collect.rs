//! Ready-made steps for collecting and summarising a whole sequence.
//!
//! Each step is a `map_batch` node pinned to whole-sequence batching, so the
//! engine default batch size never slices its input. `not_null` is a filter.
//! The `collect_*` functions are the step bodies, usable on their own.

use std::cmp::Ordering;
use std::collections::HashSet;

use rowchain_core::error::StepResult;
use rowchain_core::node::{BatchConfig, Node};
use rowchain_core::value::{key_string, kind, wrap};
use serde_json::{Number, Value};

fn whole<F>(f: F) -> Node
where
    F: Fn(Value) -> StepResult + Send + Sync + 'static,
{
    Node::map_batch_with(f, BatchConfig::whole())
}

pub fn list() -> Node {
    whole(collect_list)
}

pub fn set() -> Node {
    whole(collect_set)
}

/// Same as `list`: JSON has a single sequence type.
pub fn tuple() -> Node {
    whole(collect_list)
}

pub fn count() -> Node {
    whole(collect_count)
}

pub fn first() -> Node {
    whole(collect_first)
}

pub fn last() -> Node {
    whole(collect_last)
}

pub fn max() -> Node {
    whole(collect_max)
}

pub fn min() -> Node {
    whole(collect_min)
}

pub fn sum() -> Node {
    whole(collect_sum)
}

pub fn avg() -> Node {
    whole(collect_avg)
}

/// Print the value to stdout and pass it through unchanged.
pub fn peek() -> Node {
    whole(|v: Value| {
        println!("{v}");
        Ok(v)
    })
}

/// Drop null items from a sequence.
pub fn not_null() -> Node {
    Node::filter(|v: &Value| Ok(!v.is_null()))
}

pub fn collect_list(v: Value) -> StepResult {
    Ok(Value::Array(wrap(v)))
}

pub fn collect_set(v: Value) -> StepResult {
    let mut seen = HashSet::new();
    let unique = wrap(v)
        .into_iter()
        .filter(|item| seen.insert(key_string(item)))
        .collect();
    Ok(Value::Array(unique))
}

pub fn collect_count(v: Value) -> StepResult {
    let n = match &v {
        Value::Array(items) => items.len(),
        Value::Null => 0,
        _ => 1,
    };
    Ok(Value::from(n))
}

pub fn collect_first(v: Value) -> StepResult {
    Ok(match v {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    })
}

pub fn collect_last(v: Value) -> StepResult {
    Ok(match v {
        Value::Array(items) => items.into_iter().last().unwrap_or(Value::Null),
        other => other,
    })
}

pub fn collect_max(v: Value) -> StepResult {
    extreme(v, Ordering::Greater)
}

pub fn collect_min(v: Value) -> StepResult {
    extreme(v, Ordering::Less)
}

/// Keep the first element that no later element beats in direction `wanted`.
fn extreme(v: Value, wanted: Ordering) -> StepResult {
    let Value::Array(items) = v else {
        return Ok(v);
    };
    let mut best: Option<Value> = None;
    for item in items {
        best = match best {
            None => Some(item),
            Some(current) => {
                if compare(&item, &current)? == wanted {
                    Some(item)
                } else {
                    Some(current)
                }
            }
        };
    }
    Ok(best.unwrap_or(Value::Null))
}

fn compare(a: &Value, b: &Value) -> StepResult<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => Err(format!("cannot compare {} with {}", kind(a), kind(b)).into()),
    }
}

fn compare_numbers(x: &Number, y: &Number) -> StepResult<Ordering> {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return Ok(x.cmp(&y));
    }
    let (x, y) = (as_float(x)?, as_float(y)?);
    x.partial_cmp(&y)
        .ok_or_else(|| format!("cannot order {x} and {y}").into())
}

fn as_float(n: &Number) -> StepResult<f64> {
    n.as_f64()
        .ok_or_else(|| format!("number {n} is not representable as a float").into())
}

pub fn collect_sum(v: Value) -> StepResult {
    match v {
        Value::Null => Ok(Value::from(0)),
        Value::Number(_) => Ok(v),
        Value::Array(items) => {
            let numbers = numbers_of(&items)?;
            if let Some(ints) = numbers.iter().map(|n| n.as_i64()).collect::<Option<Vec<_>>>() {
                let total = ints
                    .into_iter()
                    .try_fold(0i64, i64::checked_add)
                    .ok_or("integer sum overflowed")?;
                return Ok(Value::from(total));
            }
            let mut total = 0.0;
            for n in numbers {
                total += as_float(n)?;
            }
            Ok(Value::from(total))
        }
        other => Err(format!("cannot sum a {}", kind(&other)).into()),
    }
}

pub fn collect_avg(v: Value) -> StepResult {
    match v {
        Value::Null => Ok(Value::from(0.0)),
        Value::Number(n) => Ok(Value::from(as_float(&n)?)),
        Value::Array(items) => {
            if items.is_empty() {
                return Ok(Value::from(0.0));
            }
            let mut total = 0.0;
            for n in numbers_of(&items)? {
                total += as_float(n)?;
            }
            Ok(Value::from(total / items.len() as f64))
        }
        other => Err(format!("cannot average a {}", kind(&other)).into()),
    }
}

fn numbers_of(items: &[Value]) -> StepResult<Vec<&Number>> {
    let mut numbers = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::Number(n) => numbers.push(n),
            other => {
                return Err(format!("element {i} is a {}, not a number", kind(other)).into())
            }
        }
    }
    Ok(numbers)
}

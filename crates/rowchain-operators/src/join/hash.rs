//! Right-side index for joins, keyed by the canonical encoding of each key.
//!
//! Keys keep first-appearance order so unmatched right rows come out of a
//! full join in the order the fetcher produced them.

use std::collections::HashMap;

use rowchain_core::error::{BoxError, StepResult};
use rowchain_core::value::key_string;
use serde_json::Value;

/// Right-side rows stored under one key.
#[derive(Debug, Clone, PartialEq)]
pub enum Matched {
    /// One-to-one mapping: the last row seen for the key.
    One(Value),
    /// One-to-many grouping: every row for the key, in input order.
    Many(Vec<Value>),
}

impl Matched {
    pub fn rows(&self) -> &[Value] {
        match self {
            Matched::One(row) => std::slice::from_ref(row),
            Matched::Many(rows) => rows,
        }
    }

    /// The value attached under a `left_property`.
    pub fn to_value(&self) -> Value {
        match self {
            Matched::One(row) => row.clone(),
            Matched::Many(rows) => Value::Array(rows.clone()),
        }
    }

    pub fn into_rows(self) -> Vec<Value> {
        match self {
            Matched::One(row) => vec![row],
            Matched::Many(rows) => rows,
        }
    }
}

#[derive(Debug, Default)]
pub struct KeyIndex {
    order: Vec<String>,
    entries: HashMap<String, Matched>,
}

impl KeyIndex {
    /// Index `rows` by `key`. On failure, returns the offending row position.
    pub fn build<F>(rows: Vec<Value>, one_to_many: bool, key: F) -> Result<Self, (usize, BoxError)>
    where
        F: Fn(&Value) -> StepResult,
    {
        let mut index = KeyIndex::default();
        for (pos, row) in rows.into_iter().enumerate() {
            let k = key_string(&key(&row).map_err(|e| (pos, e))?);
            match index.entries.get_mut(&k) {
                Some(Matched::Many(group)) => group.push(row),
                Some(slot @ Matched::One(_)) => *slot = Matched::One(row),
                None => {
                    index.order.push(k.clone());
                    let entry = if one_to_many {
                        Matched::Many(vec![row])
                    } else {
                        Matched::One(row)
                    };
                    index.entries.insert(k, entry);
                }
            }
        }
        Ok(index)
    }

    pub fn get(&self, key: &str) -> Option<&Matched> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in first-appearance order.
    pub fn into_entries(mut self) -> Vec<(String, Matched)> {
        let mut out = Vec::with_capacity(self.order.len());
        for k in self.order {
            if let Some(m) = self.entries.remove(&k) {
                out.push((k, m));
            }
        }
        out
    }
}

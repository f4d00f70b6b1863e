//! Merge-join shared by left and full joins.
//!
//! Every left row is emitted: unchanged when it has no match, with the match
//! attached under `left_property` when one is configured, or folded into one
//! shallow union per matched right row otherwise (right fields win).

use std::collections::HashSet;

use rowchain_core::join::JoinConfig;
use rowchain_core::value::{key_string, kind, shallow_merge};
use serde_json::Value;

use super::hash::KeyIndex;
use crate::traits::OpError;

#[derive(Debug)]
pub struct MergeOutcome {
    pub rows: Vec<Value>,
    /// Canonical keys of every left row, matched or not.
    pub left_keys: HashSet<String>,
}

pub fn merge_rows(
    left: Vec<Value>,
    right: &KeyIndex,
    cfg: &JoinConfig,
) -> Result<MergeOutcome, OpError> {
    let mut rows = Vec::with_capacity(left.len());
    let mut left_keys = HashSet::with_capacity(left.len());

    for (pos, row) in left.into_iter().enumerate() {
        let key = cfg
            .left_key(&row)
            .map_err(|e| OpError::join_caused(format!("left key of row {pos}"), e))?;
        let key = key_string(&key);
        let matched = right.get(&key);
        left_keys.insert(key);

        let Some(matched) = matched else {
            rows.push(row);
            continue;
        };

        match cfg.left_property() {
            Some(property) => match row {
                Value::Object(mut record) => {
                    record.insert(property.to_string(), matched.to_value());
                    rows.push(Value::Object(record));
                }
                other => {
                    return Err(OpError::join(format!(
                        "left row {pos} is a {} and cannot take property '{property}'",
                        kind(&other)
                    )));
                }
            },
            None => {
                let Value::Object(record) = &row else {
                    return Err(OpError::join(format!(
                        "left row {pos} is a {} and cannot be merged",
                        kind(&row)
                    )));
                };
                for right_row in matched.rows() {
                    let Value::Object(right_record) = right_row else {
                        return Err(OpError::join(format!(
                            "right row matched by left row {pos} is a {} and cannot be merged",
                            kind(right_row)
                        )));
                    };
                    rows.push(Value::Object(shallow_merge(record, right_record)));
                }
            }
        }
    }

    Ok(MergeOutcome { rows, left_keys })
}

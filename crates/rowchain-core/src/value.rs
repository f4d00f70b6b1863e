//! Helpers over `serde_json::Value`, the value type flowing between steps.
//!
//! Conventions:
//! - a *sequence* is `Value::Array`
//! - a *record* is `Value::Object`
//! - *absent* is `Value::Null`
//! - everything else is a scalar

use serde_json::{Map, Number, Value};

/// A single record (one row of a collection).
pub type Record = Map<String, Value>;

/// Short name of the value's JSON kind, for error messages.
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Number of rows when the value is a sequence, `None` otherwise.
pub fn row_count(value: &Value) -> Option<usize> {
    value.as_array().map(Vec::len)
}

/// Turn any value into a list: arrays are unwrapped, anything else
/// (including `null`) becomes a one-element list.
pub fn wrap(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Turn a step input into rows: arrays are unwrapped, `null` is no rows,
/// any other value is a single row.
pub fn into_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Canonical, hashable encoding of a value used as a join key.
///
/// Object fields are written in sorted order whatever the map's own order,
/// and integral floats encode like integers (`1.0` and `1` are one key).
/// Strings never collide with numbers: `"1"` keeps its quotes.
pub fn key_string(value: &Value) -> String {
    let mut out = String::new();
    write_key(value, &mut out);
    out
}

fn write_key(value: &Value, out: &mut String) {
    match value {
        Value::Number(n) => out.push_str(&canonical_number(n)),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_key(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_key(v, out);
            }
            out.push('}');
        }
        other => out.push_str(&other.to_string()),
    }
}

// Largest float below which every integral value is exact in an i64.
const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;

fn canonical_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < EXACT_INT_LIMIT => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

/// Shallow union of two records; fields from `right` win on collision.
pub fn shallow_merge(left: &Record, right: &Record) -> Record {
    let mut out = left.clone();
    for (k, v) in right {
        out.insert(k.clone(), v.clone());
    }
    out
}

/// Compact rendering capped at `max_len` characters (for logs).
pub fn preview(value: &Value, max_len: usize) -> String {
    let s = value.to_string();
    if s.chars().count() <= max_len {
        return s;
    }
    let mut cut: String = s.chars().take(max_len).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrap_and_into_rows_differ_on_null() {
        assert_eq!(wrap(Value::Null), vec![Value::Null]);
        assert!(into_rows(Value::Null).is_empty());
        assert_eq!(wrap(json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(into_rows(json!({"id": 1})), vec![json!({"id": 1})]);
    }

    #[test]
    fn key_string_is_order_independent_for_objects() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(key_string(&a), key_string(&b));
        assert_ne!(key_string(&json!(1)), key_string(&json!("1")));
    }

    #[test]
    fn key_string_sorts_nested_fields_explicitly() {
        let mut inner = Map::new();
        inner.insert("z".into(), json!(1));
        inner.insert("a".into(), json!([{"y": 2, "b": 3}]));
        assert_eq!(
            key_string(&Value::Object(inner)),
            r#"{"a":[{"b":3,"y":2}],"z":1}"#
        );
    }

    #[test]
    fn integral_floats_share_a_key_with_integers() {
        assert_eq!(key_string(&json!(1.0)), key_string(&json!(1)));
        assert_eq!(key_string(&json!(-3.0)), "-3");
        assert_eq!(key_string(&json!({"id": 2.0})), key_string(&json!({"id": 2})));
        assert_ne!(key_string(&json!(1.5)), key_string(&json!(1)));
    }

    #[test]
    fn shallow_merge_prefers_right() {
        let left = json!({"id": 1, "name": "left", "only_left": true});
        let right = json!({"name": "right", "score": 9});
        let merged = shallow_merge(left.as_object().unwrap(), right.as_object().unwrap());
        assert_eq!(
            Value::Object(merged),
            json!({"id": 1, "name": "right", "only_left": true, "score": 9})
        );
    }

    #[test]
    fn preview_truncates() {
        let v = json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(preview(&v, 5), "[1,2,...");
        assert_eq!(preview(&json!(1), 5), "1");
    }
}

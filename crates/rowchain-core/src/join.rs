//! Join configuration: which keys line up, and how matches are attached.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result, StepResult};

/// Extracts the join key from one row.
pub type KeyFn = Arc<dyn Fn(&Value) -> StepResult + Send + Sync>;

/// Key extractor helpers.
pub mod key {
    use std::sync::Arc;

    use serde_json::Value;

    use super::KeyFn;
    use crate::error::StepResult;
    use crate::value::kind;

    /// Top-level field of a record. Fails on non-records and missing fields.
    pub fn field(name: impl Into<String>) -> KeyFn {
        let name = name.into();
        Arc::new(move |row: &Value| -> StepResult {
            match row {
                Value::Object(map) => map
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| format!("missing key field '{name}'").into()),
                other => Err(format!("expected a record, found {}", kind(other)).into()),
            }
        })
    }

    /// Any closure.
    pub fn with<F>(f: F) -> KeyFn
    where
        F: Fn(&Value) -> StepResult + Send + Sync + 'static,
    {
        Arc::new(f)
    }
}

/// Validated join settings.
#[derive(Clone)]
pub struct JoinConfig {
    left_key: KeyFn,
    right_key: KeyFn,
    left_property: Option<String>,
    one_to_many: bool,
}

impl JoinConfig {
    pub fn builder() -> JoinConfigBuilder {
        JoinConfigBuilder::default()
    }

    /// Builder preset joining `left[left_field] == right[right_field]`.
    pub fn on_fields(left_field: &str, right_field: &str) -> JoinConfigBuilder {
        Self::builder()
            .left_key(key::field(left_field))
            .right_key(key::field(right_field))
    }

    pub fn left_key(&self, row: &Value) -> StepResult {
        (self.left_key)(row)
    }

    pub fn right_key(&self, row: &Value) -> StepResult {
        (self.right_key)(row)
    }

    /// Property the matched right value(s) are attached under. `None` means
    /// merge mode: right fields are folded into the left record.
    pub fn left_property(&self) -> Option<&str> {
        self.left_property.as_deref()
    }

    pub fn one_to_many(&self) -> bool {
        self.one_to_many
    }
}

impl fmt::Debug for JoinConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinConfig")
            .field("left_property", &self.left_property)
            .field("one_to_many", &self.one_to_many)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct JoinConfigBuilder {
    left_key: Option<KeyFn>,
    right_key: Option<KeyFn>,
    left_property: Option<String>,
    one_to_many: Option<bool>,
}

impl JoinConfigBuilder {
    pub fn left_key(mut self, key: KeyFn) -> Self {
        self.left_key = Some(key);
        self
    }

    pub fn right_key(mut self, key: KeyFn) -> Self {
        self.right_key = Some(key);
        self
    }

    pub fn left_property(mut self, name: impl Into<String>) -> Self {
        self.left_property = Some(name.into());
        self
    }

    pub fn one_to_many(mut self, one_to_many: bool) -> Self {
        self.one_to_many = Some(one_to_many);
        self
    }

    /// Check that every required setting is present.
    pub fn build(self) -> Result<JoinConfig> {
        let left_key = self
            .left_key
            .ok_or_else(|| Error::Validation("join left_key must be set".into()))?;
        let right_key = self
            .right_key
            .ok_or_else(|| Error::Validation("join right_key must be set".into()))?;
        let one_to_many = self
            .one_to_many
            .ok_or_else(|| Error::Validation("join one_to_many must be set".into()))?;
        if let Some(name) = &self.left_property {
            if name.is_empty() {
                return Err(Error::Validation(
                    "join left_property must not be empty".into(),
                ));
            }
        }
        Ok(JoinConfig {
            left_key,
            right_key,
            left_property: self.left_property,
            one_to_many,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_requires_keys_and_cardinality() {
        let err = JoinConfig::builder()
            .right_key(key::field("id"))
            .one_to_many(true)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("left_key"));

        let err = JoinConfig::on_fields("id", "uid").build().unwrap_err();
        assert!(err.to_string().contains("one_to_many"));

        let err = JoinConfig::on_fields("id", "uid")
            .one_to_many(false)
            .left_property("")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn left_property_is_optional() {
        let cfg = JoinConfig::on_fields("id", "uid")
            .one_to_many(false)
            .build()
            .unwrap();
        assert_eq!(cfg.left_property(), None);
        assert!(!cfg.one_to_many());
    }

    #[test]
    fn field_key_extracts_and_reports() {
        let k = key::field("id");
        assert_eq!(k(&json!({"id": 3})).unwrap(), json!(3));
        assert!(k(&json!({"other": 3}))
            .unwrap_err()
            .to_string()
            .contains("missing key field 'id'"));
        assert!(k(&json!(5)).unwrap_err().to_string().contains("number"));
    }
}

// ── Action spec domain types ──
//
// Charm-declared action schemas, reduced to the parts a caller needs to
// build an enqueue request: names, human text, and parameter types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::CoreError;

/// Scalar type of one action parameter.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PropertyType {
    #[default]
    String,
    Integer,
    Boolean,
    Number,
}

impl PropertyType {
    /// Infer a type from a default value's JSON kind.
    ///
    /// | default            | type      |
    /// |--------------------|-----------|
    /// | `true` / `false`   | `boolean` |
    /// | integral number    | `integer` |
    /// | other number       | `number`  |
    /// | anything else      | `string`  |
    pub fn infer(default: Option<&Value>) -> Self {
        match default {
            Some(Value::Bool(_)) => Self::Boolean,
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Self::Integer,
            Some(Value::Number(_)) => Self::Number,
            _ => Self::String,
        }
    }

    /// Declared type if it names one of the four known types, else
    /// inferred from the default.
    pub fn resolve(declared: Option<&str>, default: Option<&Value>) -> Self {
        declared
            .and_then(|d| d.parse().ok())
            .unwrap_or_else(|| Self::infer(default))
    }
}

// ── ActionProperty ──────────────────────────────────────────────────

/// One parameter of an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionProperty {
    pub name: String,
    pub description: String,
    /// Scalar default; non-scalar defaults are dropped.
    pub default: Option<Value>,
    #[serde(rename = "type")]
    pub kind: PropertyType,
}

impl ActionProperty {
    /// Convert command-line text to the declared type.
    pub fn coerce(&self, raw: &str) -> Result<Value, CoreError> {
        match self.kind {
            PropertyType::String => Ok(Value::String(raw.to_owned())),
            PropertyType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| self.mismatch(raw)),
            PropertyType::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| self.mismatch(raw)),
            PropertyType::Boolean => parse_bool(raw)
                .map(Value::Bool)
                .ok_or_else(|| self.mismatch(raw)),
        }
    }

    /// Convert an already-parsed JSON scalar to the declared type.
    pub fn coerce_value(&self, value: &Value) -> Result<Value, CoreError> {
        match (self.kind, value) {
            (_, Value::String(s)) => self.coerce(s),
            (PropertyType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (PropertyType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (PropertyType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Ok(value.clone())
            }
            (PropertyType::Number, Value::Number(_)) | (PropertyType::Boolean, Value::Bool(_)) => {
                Ok(value.clone())
            }
            (PropertyType::Boolean, Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(self.mismatch(&n.to_string())),
            },
            _ => Err(self.mismatch(&value.to_string())),
        }
    }

    fn mismatch(&self, raw: &str) -> CoreError {
        CoreError::Validation {
            message: format!(
                "parameter '{}' expects {}, got '{raw}'",
                self.name, self.kind
            ),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

// ── ActionSpec ──────────────────────────────────────────────────────

/// An action a service's charm declares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSpec {
    pub name: String,
    pub title: String,
    pub description: String,
    pub properties: BTreeMap<String, ActionProperty>,
}

impl ActionSpec {
    /// Coerce `key=value` pairs against this spec's properties.
    ///
    /// Keys the spec does not declare are passed through as strings;
    /// the controller validates the final parameter set.
    pub fn coerce_params<'a, I>(&self, pairs: I) -> Result<Map<String, Value>, CoreError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .map(|(key, raw)| {
                let value = match self.properties.get(key) {
                    Some(property) => property.coerce(raw)?,
                    None => {
                        tracing::warn!(action = %self.name, key, "parameter not declared by action");
                        Value::String(raw.to_owned())
                    }
                };
                Ok((key.to_owned(), value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn property(kind: PropertyType) -> ActionProperty {
        ActionProperty {
            name: "p".into(),
            description: String::new(),
            default: None,
            kind,
        }
    }

    #[test]
    fn inference_table() {
        assert_eq!(PropertyType::infer(Some(&json!(true))), PropertyType::Boolean);
        assert_eq!(PropertyType::infer(Some(&json!(3))), PropertyType::Integer);
        assert_eq!(PropertyType::infer(Some(&json!(3.0))), PropertyType::Number);
        assert_eq!(PropertyType::infer(Some(&json!("x"))), PropertyType::String);
        assert_eq!(PropertyType::infer(Some(&json!([1, 2]))), PropertyType::String);
        assert_eq!(PropertyType::infer(None), PropertyType::String);
    }

    #[test]
    fn declared_type_wins_unless_unknown() {
        assert_eq!(
            PropertyType::resolve(Some("integer"), Some(&json!("x"))),
            PropertyType::Integer
        );
        assert_eq!(
            PropertyType::resolve(Some("array"), Some(&json!(false))),
            PropertyType::Boolean
        );
        assert_eq!(PropertyType::resolve(None, None), PropertyType::String);
    }

    #[test]
    fn coerce_scalars() {
        assert_eq!(property(PropertyType::Integer).coerce(" 42 ").unwrap(), json!(42));
        assert_eq!(property(PropertyType::Number).coerce("2.5").unwrap(), json!(2.5));
        assert_eq!(property(PropertyType::String).coerce("42").unwrap(), json!("42"));
        for (raw, want) in [("Yes", true), ("off", false), ("1", true), ("FALSE", false)] {
            assert_eq!(property(PropertyType::Boolean).coerce(raw).unwrap(), json!(want));
        }
    }

    #[test]
    fn coerce_failure_names_property() {
        let err = property(PropertyType::Integer).coerce("lots").unwrap_err();
        match err {
            CoreError::Validation { message } => {
                assert!(message.contains("'p'"), "{message}");
                assert!(message.contains("integer"), "{message}");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(property(PropertyType::Number).coerce("NaN").is_err());
        assert!(property(PropertyType::Boolean).coerce("maybe").is_err());
    }

    #[test]
    fn coerce_json_values() {
        assert_eq!(
            property(PropertyType::String).coerce_value(&json!(7)).unwrap(),
            json!("7")
        );
        assert_eq!(
            property(PropertyType::Boolean).coerce_value(&json!(0)).unwrap(),
            json!(false)
        );
        assert_eq!(
            property(PropertyType::Integer).coerce_value(&json!("9")).unwrap(),
            json!(9)
        );
        assert!(property(PropertyType::Integer).coerce_value(&json!(1.5)).is_err());
        assert!(property(PropertyType::Number).coerce_value(&json!({})).is_err());
    }

    #[test]
    fn coerce_params_against_spec() {
        let mut properties = BTreeMap::new();
        properties.insert(
            "force".to_owned(),
            ActionProperty {
                name: "force".into(),
                description: "Skip checks".into(),
                default: Some(json!(false)),
                kind: PropertyType::Boolean,
            },
        );
        let spec = ActionSpec {
            name: "clean-images".into(),
            title: "clean-images".into(),
            description: String::new(),
            properties,
        };

        let params = spec
            .coerce_params([("force", "yes"), ("note", "weekly")])
            .unwrap();
        assert_eq!(Value::Object(params), json!({ "force": true, "note": "weekly" }));

        assert!(spec.coerce_params([("force", "perhaps")]).is_err());
    }
}

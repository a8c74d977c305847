//! Conditions (per-trial parameter sets) and normalized condition lists.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::{ErrorInfo, TrialError};

/// Returns `true` when `name` may be used as a condition field name.
///
/// Names start with an ASCII letter and continue with ASCII alphanumerics or
/// underscores.
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Immutable, ordered mapping from field name to value describing one trial.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<String, Value>", into = "IndexMap<String, Value>")]
pub struct Condition {
    fields: IndexMap<String, Value>,
}

impl Condition {
    /// The sentinel condition with no fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a condition from `(name, value)` pairs, preserving their order.
    ///
    /// Fails when a name is not a valid field name or appears twice.
    pub fn from_pairs<K, I>(pairs: I) -> Result<Self, TrialError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut fields = IndexMap::new();
        for (name, value) in pairs {
            let name = name.into();
            if !is_valid_field_name(&name) {
                return Err(TrialError::Configuration(
                    ErrorInfo::new("invalid-field-name", "condition field name is not valid")
                        .with_context("field", name)
                        .with_hint(
                            "names start with a letter and contain only letters, digits or '_'",
                        ),
                ));
            }
            if fields.contains_key(&name) {
                return Err(TrialError::Configuration(
                    ErrorInfo::new("duplicate-field-name", "condition field name is repeated")
                        .with_context("field", name),
                ));
            }
            fields.insert(name, value);
        }
        Ok(Self { fields })
    }

    /// Returns the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` for the sentinel condition.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrows the underlying ordered map.
    pub fn as_map(&self) -> &IndexMap<String, Value> {
        &self.fields
    }
}

impl TryFrom<IndexMap<String, Value>> for Condition {
    type Error = TrialError;

    fn try_from(fields: IndexMap<String, Value>) -> Result<Self, Self::Error> {
        Condition::from_pairs(fields)
    }
}

impl From<Condition> for IndexMap<String, Value> {
    fn from(condition: Condition) -> Self {
        condition.fields
    }
}

/// Ordered list of conditions for one loop, never empty.
///
/// An empty input is normalized to a single sentinel [`Condition::empty`], so
/// a loop always has at least one stimulus to repeat.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConditionList {
    conditions: Vec<Condition>,
}

impl ConditionList {
    /// Wraps `conditions`, substituting the sentinel when the list is empty.
    pub fn new(conditions: Vec<Condition>) -> Self {
        if conditions.is_empty() {
            warn!("empty condition list normalized to a single empty condition");
            return Self::sentinel();
        }
        Self { conditions }
    }

    /// The single-entry list holding the sentinel condition.
    pub fn sentinel() -> Self {
        Self {
            conditions: vec![Condition::empty()],
        }
    }

    /// Normalizes an optional list.
    pub fn from_optional(conditions: Option<Vec<Condition>>) -> Self {
        Self::new(conditions.unwrap_or_default())
    }

    /// Builds a list from a JSON value: `null`, or an array of objects.
    pub fn from_value(value: Value) -> Result<Self, TrialError> {
        match value {
            Value::Null => Ok(Self::sentinel()),
            Value::Array(items) => {
                let mut conditions = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    match item {
                        Value::Object(map) => conditions.push(Condition::from_pairs(map)?),
                        other => {
                            return Err(TrialError::Configuration(
                                ErrorInfo::new(
                                    "malformed-condition",
                                    "condition entries must be objects",
                                )
                                .with_context("index", index.to_string())
                                .with_context("found", json_kind(&other)),
                            ))
                        }
                    }
                }
                Ok(Self::new(conditions))
            }
            other => Err(TrialError::Configuration(
                ErrorInfo::new(
                    "malformed-condition-list",
                    "condition list must be null or an array of objects",
                )
                .with_context("found", json_kind(&other)),
            )),
        }
    }

    /// Number of conditions (`nStim`), at least one.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Always `false`; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns the condition at `index`.
    pub fn get(&self, index: usize) -> Option<&Condition> {
        self.conditions.get(index)
    }

    /// Field names of the first condition; the schema is assumed homogeneous.
    pub fn attributes(&self) -> Vec<String> {
        self.conditions
            .first()
            .map(|first| first.field_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Returns `true` when the list only holds the sentinel condition.
    pub fn is_sentinel(&self) -> bool {
        self.conditions.len() == 1 && self.conditions[0].is_empty()
    }

    /// Borrows the conditions.
    pub fn as_slice(&self) -> &[Condition] {
        &self.conditions
    }
}

impl From<Vec<Condition>> for ConditionList {
    fn from(conditions: Vec<Condition>) -> Self {
        Self::new(conditions)
    }
}

impl<'de> Deserialize<'de> for ConditionList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let conditions = Option::<Vec<Condition>>::deserialize(deserializer)?;
        Ok(Self::from_optional(conditions))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

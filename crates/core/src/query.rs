//! Store-agnostic query description: filter, field projection, limit.
//!
//! Queries are evaluated against the JSON rendering of a record so that any
//! backend (in-memory, SQL, document store) can interpret them the same way.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::id::json_loosely_eq;

/// One filter condition on a top-level record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    /// `field == value` (identifiers compare loosely).
    Eq { field: String, value: JsonValue },
    /// `field` equals one of `values`.
    In { field: String, values: Vec<JsonValue> },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq { field, .. } | Condition::In { field, .. } => field,
        }
    }

    fn matches(&self, record: &Map<String, JsonValue>) -> bool {
        let actual = record.get(self.field()).unwrap_or(&JsonValue::Null);
        match self {
            Condition::Eq { value, .. } => json_loosely_eq(actual, value),
            Condition::In { values, .. } => values.iter().any(|v| json_loosely_eq(actual, v)),
        }
    }
}

/// Query refinement accepted by record stores.
///
/// All conditions are AND-ed. An empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, rename = "where")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn any_of<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        self.conditions.push(Condition::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a record (rendered as a JSON object) satisfies every condition.
    ///
    /// Non-object renderings never match a non-empty filter.
    pub fn matches(&self, record: &JsonValue) -> bool {
        match record.as_object() {
            Some(obj) => self.conditions.iter().all(|c| c.matches(obj)),
            None => self.conditions.is_empty(),
        }
    }

    /// Apply the field projection. `id` is always kept.
    pub fn project(&self, record: JsonValue) -> JsonValue {
        self.project_keeping(record, &[])
    }

    /// Apply the field projection, also keeping `id` and every field in `keep`.
    pub fn project_keeping(&self, record: JsonValue, keep: &[&str]) -> JsonValue {
        let Some(fields) = &self.fields else {
            return record;
        };
        match record {
            JsonValue::Object(mut obj) => {
                obj.retain(|k, _| k == "id" || keep.contains(&k.as_str()) || fields.iter().any(|f| f == k));
                JsonValue::Object(obj)
            }
            other => other,
        }
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A learned value for one (label, field).
///
/// Serialized untagged so the persisted template cache is a plain
/// `field → value` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateRule {
    /// Expected to recur verbatim in future documents of the same label.
    Literal(String),
    /// Label-invariant sequence (e.g. fixed column headers), never re-validated.
    Sequence(Vec<Value>),
}

impl TemplateRule {
    /// Learning gate: only non-empty strings and non-empty sequences qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Literal(s.clone())),
            Value::Array(items) if !items.is_empty() => Some(Self::Sequence(items.clone())),
            _ => None,
        }
    }

    /// Whether this rule can be trusted for a document with the given text.
    pub fn validate(&self, text: &str) -> bool {
        match self {
            Self::Literal(expected) => text.contains(expected.as_str()),
            Self::Sequence(_) => true,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Literal(s) => Value::String(s.clone()),
            Self::Sequence(items) => Value::Array(items.clone()),
        }
    }
}

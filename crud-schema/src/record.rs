//! Records and record identifiers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A stored or submitted record: field name to JSON value.
///
/// Insertion order is preserved, so projections come out in schema
/// declaration order.
pub type Record = Map<String, Value>;

/// Identifier of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric ID
    Int(i64),
    /// String ID
    Str(String),
}

impl RecordId {
    /// Parse an id taken from a URL path segment.
    ///
    /// Canonical decimal integers become [`RecordId::Int`]; anything else
    /// (including `"007"`) stays a string.
    ///
    /// # Example
    ///
    /// ```
    /// use crud_schema::RecordId;
    ///
    /// assert_eq!(RecordId::parse("42"), RecordId::Int(42));
    /// assert_eq!(RecordId::parse("007"), RecordId::Str("007".into()));
    /// assert_eq!(RecordId::parse("abc"), RecordId::Str("abc".into()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => RecordId::Int(n),
            _ => RecordId::Str(s.to_string()),
        }
    }

    /// Read an id from a JSON value, if it is a string or an integer.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) => Some(RecordId::Str(s.clone())),
            _ => None,
        }
    }

    /// Read the `id` field of a record.
    pub fn of(record: &Record) -> Option<Self> {
        record.get("id").and_then(Self::from_value)
    }

    /// Convert into a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Int(n) => Value::from(*n),
            RecordId::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Str(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_of_record() {
        let record = json!({"id": 7, "name": "x"});
        assert_eq!(RecordId::of(record.as_object().unwrap()), Some(RecordId::Int(7)));

        let record = json!({"id": "a-1"});
        assert_eq!(
            RecordId::of(record.as_object().unwrap()),
            Some(RecordId::Str("a-1".into()))
        );

        let record = json!({"id": true});
        assert_eq!(RecordId::of(record.as_object().unwrap()), None);
    }

    #[test]
    fn test_untagged_serde() {
        let id: RecordId = serde_json::from_str("12").unwrap();
        assert_eq!(id, RecordId::Int(12));
        let id: RecordId = serde_json::from_str(r#""x""#).unwrap();
        assert_eq!(id.to_string(), "x");
        assert_eq!(RecordId::Int(3).to_value(), json!(3));
    }
}

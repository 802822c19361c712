use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A canonical record: one contract-shaped field→value mapping.
pub type Record = serde_json::Map<String, Value>;

/// Identifier key for records in a resource table.
///
/// Integer ids order numerically ahead of string ids, which matches the
/// iteration order of numeric object keys in the wire format this crate
/// mirrors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    /// Extract an identifier from a JSON value. Only integers and strings
    /// are identifier-shaped; anything else is not an id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Str(s) => Value::from(s.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

/// Read the `id` field of a record, if one is present and identifier-shaped.
pub fn record_id(record: &Record) -> Option<RecordId> {
    record.get("id").and_then(RecordId::from_value)
}

/// Total ordering over JSON values for the query operator's `order` resolver.
///
/// Null sorts last; mixed numeric types coerce to float. Values of
/// unrelated types fall back to a fixed type rank so sorting never fails.
pub fn value_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,

        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            match (x.is_nan(), y.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            }
        }

        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),

        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_ordering() {
        let mut ids = vec![
            RecordId::from("zeta"),
            RecordId::from(10),
            RecordId::from(2),
            RecordId::from("alpha"),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                RecordId::from(2),
                RecordId::from(10),
                RecordId::from("alpha"),
                RecordId::from("zeta"),
            ]
        );
    }

    #[test]
    fn test_record_id_from_value() {
        assert_eq!(RecordId::from_value(&json!(3)), Some(RecordId::Int(3)));
        assert_eq!(
            RecordId::from_value(&json!("abc")),
            Some(RecordId::Str("abc".to_string()))
        );
        assert_eq!(RecordId::from_value(&json!(null)), None);
        assert_eq!(RecordId::from_value(&json!({"id": 1})), None);
    }

    #[test]
    fn test_value_cmp_null_last() {
        assert_eq!(value_cmp(&json!(null), &json!(1)), Ordering::Greater);
        assert_eq!(value_cmp(&json!(1), &json!(null)), Ordering::Less);
        assert_eq!(value_cmp(&json!(1), &json!(2.5)), Ordering::Less);
        assert_eq!(value_cmp(&json!("a"), &json!("b")), Ordering::Less);
    }
}

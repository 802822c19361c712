use rand::seq::SliceRandom;
use serde_json::Value;

use crate::core::{RecordId, Result, StoreError};
use crate::store::table::TableState;

/// Parsed input to the base getter: everything, one record, or a subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    One(RecordId),
    Many(Vec<RecordId>),
}

impl Selector {
    /// Interpret a loose getter argument. Null selects everything; an
    /// identifier selects one record; an array of identifiers selects a
    /// subset in input order. Anything else is malformed.
    pub fn from_value(input: &Value) -> Result<Self> {
        match input {
            Value::Null => Ok(Self::All),
            Value::Number(_) | Value::String(_) => RecordId::from_value(input)
                .map(Self::One)
                .ok_or_else(|| StoreError::Query(format!("{input}"))),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    RecordId::from_value(item)
                        .ok_or_else(|| StoreError::Query(format!("{item}")))
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Many),
            other => Err(StoreError::Query(format!("{other}"))),
        }
    }
}

impl From<RecordId> for Selector {
    fn from(id: RecordId) -> Self {
        Self::One(id)
    }
}

impl From<i64> for Selector {
    fn from(id: i64) -> Self {
        Self::One(RecordId::from(id))
    }
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Self::One(RecordId::from(id))
    }
}

/// Base retrieval getter.
///
/// Missing records resolve to null rather than an error; subset
/// retrieval preserves input order and length. Singleton tables ignore
/// the selector and return the bare record.
pub fn base(table: &TableState, selector: &Selector) -> Value {
    if let Some(record) = table.singleton_record() {
        return Value::Object(record.clone());
    }

    match selector {
        Selector::All => Value::Array(
            table
                .records()
                .into_iter()
                .map(Value::Object)
                .collect(),
        ),
        Selector::One(id) => table
            .get(id)
            .map(|record| Value::Object(record.clone()))
            .unwrap_or(Value::Null),
        Selector::Many(ids) => Value::Array(
            ids.iter()
                .map(|id| {
                    table
                        .get(id)
                        .map(|record| Value::Object(record.clone()))
                        .unwrap_or(Value::Null)
                })
                .collect(),
        ),
    }
}

/// Uniform random sample without replacement. A sample of one resolves
/// to a single record, larger samples to an array.
pub fn sample(table: &TableState, n: usize) -> Value {
    if let Some(record) = table.singleton_record() {
        return Value::Object(record.clone());
    }

    let keys = table.keys();
    let mut rng = rand::thread_rng();

    if n == 1 {
        return keys
            .choose(&mut rng)
            .and_then(|id| table.get(id))
            .map(|record| Value::Object(record.clone()))
            .unwrap_or(Value::Null);
    }

    Value::Array(
        keys.choose_multiple(&mut rng, n)
            .filter_map(|id| table.get(id))
            .map(|record| Value::Object(record.clone()))
            .collect(),
    )
}

use std::collections::BTreeMap;

use log::debug;
use serde_json::Value;

use crate::contract::{Contract, defaults};
use crate::core::{Record, RecordId, Result, StoreError, record_id};

/// Canonical storage for one resource.
///
/// Collection resources key records by identifier; singleton resources
/// hold a single bare record. The variant is fixed at registration time
/// from the resource configuration.
#[derive(Debug, Clone)]
pub enum TableState {
    Collection(BTreeMap<RecordId, Record>),
    Singleton(Record),
}

impl TableState {
    pub fn new(singleton: bool) -> Self {
        if singleton {
            Self::Singleton(Record::new())
        } else {
            Self::Collection(BTreeMap::new())
        }
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self, Self::Singleton(_))
    }

    /// Merge an incoming canonical record into the table.
    ///
    /// Collection merge layers contract defaults, then the existing
    /// entry, then the incoming record (later layers win) and requires
    /// an `id` on the incoming record. Singleton merge applies the same
    /// layering to the whole table record.
    pub fn sync(&mut self, contract: &Contract, record: Record) -> Result<Option<RecordId>> {
        match self {
            Self::Collection(table) => {
                let Some(id) = record_id(&record) else {
                    return Err(StoreError::Contract(
                        "Sync mutation must include 'id' key in mutation inputs.".to_string(),
                    ));
                };

                let mut merged = defaults(contract);
                if let Some(existing) = table.get(&id) {
                    merged.extend(existing.clone());
                }
                merged.extend(record);

                debug!("sync record {id}");
                table.insert(id.clone(), merged);
                Ok(Some(id))
            }
            Self::Singleton(current) => {
                let mut merged = defaults(contract);
                merged.extend(current.clone());
                merged.extend(record);
                *current = merged;
                Ok(None)
            }
        }
    }

    /// Delete a keyed entry; absent ids are a no-op. The singleton variant
    /// resets the record to contract defaults.
    pub fn remove(&mut self, contract: &Contract, id: Option<&RecordId>) {
        match self {
            Self::Collection(table) => {
                if let Some(id) = id {
                    table.remove(id);
                }
            }
            Self::Singleton(current) => *current = defaults(contract),
        }
    }

    /// Replace an entry with its id plus the contract defaults, or the singleton record
    /// with its defaults.
    pub fn reset(&mut self, contract: &Contract, id: Option<&RecordId>) -> Result<()> {
        match self {
            Self::Collection(table) => {
                let id = id.ok_or_else(|| {
                    StoreError::Contract(
                        "Reset mutation must include 'id' key in mutation inputs.".to_string(),
                    )
                })?;
                let mut record = Record::new();
                record.insert("id".to_string(), id.to_value());
                record.extend(defaults(contract));
                table.insert(id.clone(), record);
            }
            Self::Singleton(current) => *current = defaults(contract),
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        match self {
            Self::Collection(table) => table.clear(),
            Self::Singleton(current) => *current = Record::new(),
        }
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        match self {
            Self::Collection(table) => table.get(id),
            Self::Singleton(_) => None,
        }
    }

    pub fn keys(&self) -> Vec<RecordId> {
        match self {
            Self::Collection(table) => table.keys().cloned().collect(),
            Self::Singleton(_) => Vec::new(),
        }
    }

    pub fn records(&self) -> Vec<Record> {
        match self {
            Self::Collection(table) => table.values().cloned().collect(),
            Self::Singleton(record) => vec![record.clone()],
        }
    }

    pub fn singleton_record(&self) -> Option<&Record> {
        match self {
            Self::Singleton(record) => Some(record),
            Self::Collection(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Collection(table) => table.len(),
            Self::Singleton(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Collection(table) => table.is_empty(),
            Self::Singleton(record) => record.is_empty(),
        }
    }

    /// Whole-table snapshot, as exposed through the store's state key.
    pub fn snapshot(&self) -> Value {
        match self {
            Self::Collection(table) => Value::Object(
                table
                    .iter()
                    .map(|(id, record)| (id.to_string(), Value::Object(record.clone())))
                    .collect(),
            ),
            Self::Singleton(record) => Value::Object(record.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Field;
    use serde_json::json;

    fn contract() -> Contract {
        let mut contract = Contract::new();
        contract.insert("title".to_string(), Field::new().default_value("untitled"));
        contract.insert("body".to_string(), Field::new());
        contract
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_sync_requires_id() {
        let mut table = TableState::new(false);
        let err = table
            .sync(&contract(), record(json!({"title": "a"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::Contract(_)));
    }

    #[test]
    fn test_sync_merges_defaults_and_existing() {
        let contract = contract();
        let mut table = TableState::new(false);

        table
            .sync(&contract, record(json!({"id": 1, "body": "b"})))
            .unwrap();
        let entry = table.get(&RecordId::from(1)).unwrap();
        assert_eq!(entry["title"], json!("untitled"));
        assert_eq!(entry["body"], json!("b"));

        // partial update keeps previous values
        table
            .sync(&contract, record(json!({"id": 1, "title": "t"})))
            .unwrap();
        let entry = table.get(&RecordId::from(1)).unwrap();
        assert_eq!(entry["title"], json!("t"));
        assert_eq!(entry["body"], json!("b"));
    }

    #[test]
    fn test_sync_is_idempotent() {
        let contract = contract();
        let mut table = TableState::new(false);
        let data = record(json!({"id": 2, "title": "x"}));

        table.sync(&contract, data.clone()).unwrap();
        let first = table.get(&RecordId::from(2)).cloned();
        table.sync(&contract, data).unwrap();
        assert_eq!(table.get(&RecordId::from(2)).cloned(), first);
    }

    #[test]
    fn test_remove_and_reset() {
        let contract = contract();
        let mut table = TableState::new(false);
        table
            .sync(&contract, record(json!({"id": 1, "title": "a", "body": "b"})))
            .unwrap();

        table.reset(&contract, Some(&RecordId::from(1))).unwrap();
        let entry = table.get(&RecordId::from(1)).unwrap();
        assert_eq!(entry["id"], json!(1));
        assert_eq!(entry["title"], json!("untitled"));
        assert!(!entry.contains_key("body"));

        table.remove(&contract, Some(&RecordId::from(1)));
        assert!(table.get(&RecordId::from(1)).is_none());

        // removing an absent id is not an error
        table.remove(&contract, Some(&RecordId::from(99)));
    }

    #[test]
    fn test_singleton_sync_and_reset() {
        let contract = contract();
        let mut table = TableState::new(true);

        table
            .sync(&contract, record(json!({"body": "hello"})))
            .unwrap();
        let current = table.singleton_record().unwrap();
        assert_eq!(current["title"], json!("untitled"));
        assert_eq!(current["body"], json!("hello"));

        table.remove(&contract, None);
        let current = table.singleton_record().unwrap();
        assert_eq!(current["title"], json!("untitled"));
        assert!(!current.contains_key("body"));
    }
}

use serde_json::Value;

use crate::core::{Record, RecordId, Result, StoreError, record_id};
use crate::model::instance::Instance;
use crate::query::Query;
use crate::store::{Selector, Store};

/// Model-level API bound to one registered resource.
///
/// Thin front over the store's dispatch/getter boundary that returns
/// [`Instance`] wrappers instead of raw records.
pub struct Model {
    store: Store,
    name: String,
}

impl Model {
    pub(crate) fn new(store: Store, name: &str) -> Self {
        Self {
            store,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch the remote collection (or singleton) into the store and
    /// return instances over the synced records.
    pub async fn fetch(&self, params: Option<Record>) -> Result<Vec<Instance>> {
        let payload = params.map(Value::Object).unwrap_or(Value::Null);
        let fetched = self
            .store
            .dispatch(&format!("{}.fetch", self.name), payload)
            .await?;

        match fetched {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|item| item.as_object().and_then(record_id))
                .map(|id| Instance::attached(self.store.clone(), &self.name, Some(id)))
                .collect()),
            Value::Object(_) => Ok(vec![Instance::attached(
                self.store.clone(),
                &self.name,
                None,
            )]),
            other => Err(StoreError::Contract(format!(
                "Unexpected fetch result `{other}` for model '{}'.",
                self.name
            ))),
        }
    }

    /// Retrieve one record by id and return an instance over it.
    pub async fn get(&self, id: impl Into<RecordId>) -> Result<Instance> {
        let id = id.into();
        self.store
            .dispatch(&format!("{}.get", self.name), id.to_value())
            .await?;
        Ok(Instance::attached(self.store.clone(), &self.name, Some(id)))
    }

    /// Query the already-materialized table, optionally narrowed to a
    /// selection of identifiers.
    pub fn query(&self, input: Option<Selector>) -> Result<Query> {
        let input = match input.unwrap_or(Selector::All) {
            Selector::All => Value::Null,
            Selector::One(id) => id.to_value(),
            Selector::Many(ids) => Value::Array(ids.iter().map(RecordId::to_value).collect()),
        };
        let selected = self.store.getter_with(&self.name, input)?;

        let records = match selected {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| item.as_object().cloned())
                .collect(),
            Value::Object(record) => vec![record],
            _ => Vec::new(),
        };
        Ok(Query::new(records))
    }

    /// A new, uncommitted instance seeded with caller data over the
    /// contract defaults.
    pub fn instance(&self, data: Value) -> Result<Instance> {
        let record = match data {
            Value::Null => Record::new(),
            Value::Object(record) => record,
            other => {
                return Err(StoreError::Contract(format!(
                    "Model data must be an object, got `{other}`."
                )));
            }
        };
        Instance::new(self.store.clone(), &self.name, record)
    }

    /// Contract template for this model: every field, defaulted or null.
    pub fn template(&self) -> Result<Value> {
        self.store.getter(&format!("{}.template", self.name))
    }
}

use log::debug;
use serde_json::Value;

use crate::core::{Record, RecordId, Result, StoreError, record_id};
use crate::store::Store;

/// Lifecycle of a model instance.
///
/// `New` instances have no identifier yet; a successful commit moves them
/// to `Persisted`; a successful delete leaves the instance inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    New,
    Persisted,
    Deleted,
}

/// Accessor-layer wrapper around one record.
///
/// Writes land in a local overlay that is never merged into the canonical
/// table until `commit`; reads prefer the overlay and fall back to the
/// canonical snapshot for the bound identifier. Two instances may wrap the
/// same record with independent overlays; the last commit wins.
pub struct Instance {
    store: Store,
    resource: String,
    id: Option<RecordId>,
    overlay: Record,
    state: InstanceState,
}

impl Instance {
    /// Build a new, uncommitted instance from caller data layered over
    /// the contract defaults.
    pub(crate) fn new(store: Store, resource: &str, data: Record) -> Result<Self> {
        let res = store.resource(resource)?;
        let id = record_id(&data);

        let mut instance = Self {
            store: store.clone(),
            resource: resource.to_string(),
            id: id.clone(),
            overlay: crate::contract::defaults(&res.contract),
            state: if id.is_some() {
                InstanceState::Persisted
            } else {
                InstanceState::New
            },
        };
        for (field, value) in data {
            if field != "id" {
                instance.set(&field, value)?;
            }
        }
        Ok(instance)
    }

    /// Wrap an already-persisted canonical record; reads pass through to
    /// the table until the first local edit.
    pub(crate) fn attached(store: Store, resource: &str, id: Option<RecordId>) -> Self {
        Self {
            store,
            resource: resource.to_string(),
            id,
            overlay: Record::new(),
            state: InstanceState::Persisted,
        }
    }

    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    /// Read a field: overlay first, then the canonical table snapshot.
    /// Unknown fields and unbound instances read as null.
    pub fn get(&self, field: &str) -> Value {
        if field == "id" {
            return self.id.as_ref().map(RecordId::to_value).unwrap_or(Value::Null);
        }

        let value = match self.overlay.get(field) {
            Some(value) => value.clone(),
            None => self.canonical_field(field),
        };
        self.resolve_relation(field, value)
    }

    /// Write a field into the local overlay.
    ///
    /// Applies the contract's per-field coercion and normalizes nested
    /// references, but keeps the value otherwise raw: mutation,
    /// required, and validate checks all run once, when commit formats
    /// the payload for the wire. Rebinding the identifier of a
    /// persisted instance is illegal.
    pub fn set(&mut self, field: &str, value: Value) -> Result<()> {
        if field == "id" {
            return self.set_id(value);
        }

        let resource = self.store.resource(&self.resource)?;
        let Some(descriptor) = resource.contract.get(field) else {
            self.overlay.insert(field.to_string(), value);
            return Ok(());
        };

        let mut value = value;

        // nested reference normalization: an object carrying only an id is
        // a reference and is stored as the raw identifier
        if descriptor.relation.is_some()
            && let Value::Object(nested) = &value
            && nested.len() == 1
            && nested.contains_key("id")
        {
            value = nested["id"].clone();
        }

        if let Some(field_type) = descriptor.field_type {
            value = field_type.coerce(&value)?;
        }

        self.overlay.insert(field.to_string(), value);
        Ok(())
    }

    fn set_id(&mut self, value: Value) -> Result<()> {
        let incoming = RecordId::from_value(&value);
        if self.state == InstanceState::Persisted
            && let (Some(current), Some(incoming)) = (&self.id, &incoming)
            && current != incoming
        {
            return Err(StoreError::Identity(format!(
                "Instance is bound to record {current} and cannot be reassigned to {incoming}."
            )));
        }
        if incoming.is_some() || value.is_null() {
            self.id = incoming;
            Ok(())
        } else {
            Err(StoreError::Identity(format!(
                "`{value}` is not a valid identifier."
            )))
        }
    }

    /// Commit local edits: create when unbound, update when bound.
    ///
    /// Only the overlay travels: canonical values the caller never
    /// touched are already formatted and must not pass through the push
    /// pipeline again. On success the overlay is cleared and reads fall
    /// back to the synced canonical record.
    pub async fn commit(&mut self) -> Result<()> {
        if self.state == InstanceState::Deleted {
            return Err(StoreError::State(
                "Cannot commit a deleted instance.".to_string(),
            ));
        }

        let resource = self.store.resource(&self.resource)?;
        let mut payload = self.overlay.clone();

        let action = if resource.singleton {
            "update"
        } else {
            match &self.id {
                Some(id) => {
                    payload.insert("id".to_string(), id.to_value());
                    "update"
                }
                None => {
                    payload.remove("id");
                    "create"
                }
            }
        };

        let committed = self
            .store
            .dispatch(&format!("{}.{action}", self.resource), Value::Object(payload))
            .await?;

        if let Value::Object(record) = committed {
            self.id = record_id(&record).or_else(|| self.id.clone());
            self.overlay.clear();
            self.state = InstanceState::Persisted;
            debug!("committed '{}' instance", self.resource);
        }
        Ok(())
    }

    /// Apply a partial edit and commit it.
    pub async fn update(&mut self, partial: Record) -> Result<()> {
        for (field, value) in partial {
            self.set(&field, value)?;
        }
        self.commit().await
    }

    /// Delete the bound record and render the instance inert.
    pub async fn delete(&mut self) -> Result<()> {
        let resource = self.store.resource(&self.resource)?;

        let payload = if resource.singleton {
            Value::Null
        } else {
            let id = self.id.as_ref().ok_or_else(|| {
                StoreError::State("Cannot delete an instance without an id.".to_string())
            })?;
            id.to_value()
        };

        self.store
            .dispatch(&format!("{}.delete", self.resource), payload)
            .await?;

        self.overlay.clear();
        self.id = None;
        self.state = InstanceState::Deleted;
        Ok(())
    }

    /// Plain snapshot of the current view: canonical baseline layered
    /// with the local overlay.
    pub fn json(&self) -> Result<Value> {
        let mut snapshot = self.baseline()?;
        snapshot.extend(self.overlay.clone());
        if let Some(id) = &self.id {
            snapshot.insert("id".to_string(), id.to_value());
        }
        Ok(Value::Object(snapshot))
    }

    fn baseline(&self) -> Result<Record> {
        let resource = self.store.resource(&self.resource)?;
        match self.store.resolve(&resource, self.id.as_ref())? {
            Value::Object(record) => Ok(record),
            _ => Ok(Record::new()),
        }
    }

    fn canonical_field(&self, field: &str) -> Value {
        self.baseline()
            .ok()
            .and_then(|record| record.get(field).cloned())
            .unwrap_or(Value::Null)
    }

    /// Lazy resolution of related-model references: a scalar identifier
    /// on a relation field resolves against the related resource table,
    /// falling back to a stub `{id}` record when not yet loaded.
    fn resolve_relation(&self, field: &str, value: Value) -> Value {
        let Ok(resource) = self.store.resource(&self.resource) else {
            return value;
        };
        let Some(related) = resource
            .contract
            .get(field)
            .and_then(|descriptor| descriptor.relation.as_deref())
        else {
            return value;
        };
        let Some(id) = RecordId::from_value(&value) else {
            return value;
        };

        match self.store.resource(related) {
            Ok(related) => {
                let Ok(table) = related.table.read() else {
                    return value;
                };
                match table.get(&id) {
                    Some(record) => Value::Object(record.clone()),
                    None => serde_json::json!({ "id": value }),
                }
            }
            Err(_) => serde_json::json!({ "id": value }),
        }
    }
}

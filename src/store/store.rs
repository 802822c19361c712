use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use log::debug;
use serde_json::Value;

use crate::actions;
use crate::contract::{self, Contract};
use crate::core::{Record, RecordId, Result, StoreError};
use crate::model::{ActionConfig, ApiConfig, Model, ResourceConfig};
use crate::store::getters::{self, Selector};
use crate::store::table::TableState;
use crate::transport::Transport;

/// One registered resource: normalized contract plus its canonical table.
pub(crate) struct Resource {
    pub name: String,
    pub singleton: bool,
    pub api: ApiConfig,
    pub actions: BTreeMap<String, ActionConfig>,
    pub contract: Contract,
    pub table: RwLock<TableState>,
}

struct StoreInner {
    resources: BTreeMap<String, Arc<Resource>>,
    transport: Arc<dyn Transport>,
}

/// The centralized store: per-resource canonical tables plus the
/// string-keyed getter/mutation/action boundary.
///
/// Handles are cheap to clone and share one underlying store. Registered
/// names follow the fixed scheme: getters `R`, `R.one`, `R.all`,
/// `R.sample`, `R.template`, `R.defaults`; mutations `R.sync`, `R.reset`,
/// `R.remove`, `R.clear`; actions `R.fetch`, `R.create`, `R.update`,
/// `R.get`, `R.delete`.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

pub struct StoreBuilder {
    transport: Option<Arc<dyn Transport>>,
    configs: Vec<ResourceConfig>,
}

impl StoreBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn resource(mut self, config: ResourceConfig) -> Self {
        self.configs.push(config);
        self
    }

    pub fn build(self) -> Result<Store> {
        let transport = self.transport.ok_or_else(|| {
            StoreError::Config("Store requires a transport implementation.".to_string())
        })?;

        let mut resources = BTreeMap::new();
        for config in self.configs {
            if config.name.is_empty() {
                return Err(StoreError::Config(
                    "Resource name must not be empty.".to_string(),
                ));
            }
            if resources.contains_key(&config.name) {
                return Err(StoreError::Config(format!(
                    "Resource '{}' is registered twice.",
                    config.name
                )));
            }

            // normalization is a pure transform; caller config stays intact
            let contract = contract::normalize(&config.contract);
            let resource = Resource {
                name: config.name.clone(),
                singleton: config.singleton,
                api: config.api,
                actions: config.actions,
                contract,
                table: RwLock::new(TableState::new(config.singleton)),
            };
            debug!("register resource '{}'", resource.name);
            resources.insert(config.name, Arc::new(resource));
        }

        Ok(Store {
            inner: Arc::new(StoreInner {
                resources,
                transport,
            }),
        })
    }
}

impl Store {
    pub fn builder() -> StoreBuilder {
        StoreBuilder {
            transport: None,
            configs: Vec::new(),
        }
    }

    pub(crate) fn resource(&self, name: &str) -> Result<Arc<Resource>> {
        self.inner.resources.get(name).cloned().ok_or_else(|| {
            StoreError::Config(format!("Model '{name}' is not registered with the store."))
        })
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.inner.transport)
    }

    /// A model handle bound to this store.
    pub fn model(&self, name: &str) -> Result<Model> {
        self.resource(name)?;
        Ok(Model::new(self.clone(), name))
    }

    /// Raw table snapshot for a resource's state key.
    pub fn state(&self, name: &str) -> Result<Value> {
        let resource = self.resource(name)?;
        let table = resource.table.read()?;
        Ok(table.snapshot())
    }

    /// Argument-free getter (`R`, `R.all`, `R.template`, `R.defaults`,
    /// single-record `R.sample`).
    pub fn getter(&self, name: &str) -> Result<Value> {
        self.getter_with(name, Value::Null)
    }

    /// Getter with an input argument, e.g. an identifier for `R.one` or a
    /// sample size for `R.sample`.
    pub fn getter_with(&self, name: &str, input: Value) -> Result<Value> {
        let (resource, op) = split_key(name);
        let resource = self.resource(resource)?;
        let table = resource.table.read()?;

        match op {
            None => Ok(getters::base(&table, &Selector::from_value(&input)?)),
            Some("one") => {
                let id = RecordId::from_value(&input)
                    .ok_or_else(|| StoreError::Query(format!("{input}")))?;
                Ok(getters::base(&table, &Selector::One(id)))
            }
            Some("all") => Ok(getters::base(&table, &Selector::All)),
            Some("sample") => {
                let n = match &input {
                    Value::Null => 1,
                    Value::Number(n) => n
                        .as_u64()
                        .ok_or_else(|| StoreError::Query(format!("{input}")))?
                        as usize,
                    other => return Err(StoreError::Query(format!("{other}"))),
                };
                Ok(getters::sample(&table, n))
            }
            Some("template") => Ok(Value::Object(contract::template(&resource.contract))),
            Some("defaults") => Ok(Value::Object(contract::defaults(&resource.contract))),
            Some(other) => Err(StoreError::Config(format!(
                "Store has no getter '{}.{other}'.",
                resource.name
            ))),
        }
    }

    /// Apply a table mutation: `R.sync`, `R.remove`, `R.reset`, `R.clear`.
    pub fn commit(&self, name: &str, payload: Value) -> Result<()> {
        let (resource, op) = split_key(name);
        let resource = self.resource(resource)?;
        let mut table = resource.table.write()?;

        match op {
            Some("sync") => match payload {
                Value::Object(record) => {
                    table.sync(&resource.contract, record)?;
                }
                Value::Array(records) => {
                    for item in records {
                        let record = as_record(item)?;
                        table.sync(&resource.contract, record)?;
                    }
                }
                other => {
                    return Err(StoreError::Contract(format!(
                        "Sync mutation expects record data, got `{other}`."
                    )));
                }
            },
            Some("remove") => {
                let id = RecordId::from_value(&payload);
                table.remove(&resource.contract, id.as_ref());
            }
            Some("reset") => {
                let id = RecordId::from_value(&payload);
                table.reset(&resource.contract, id.as_ref())?;
            }
            Some("clear") => table.clear(),
            _ => {
                return Err(StoreError::Config(format!(
                    "Store has no mutation '{name}'."
                )));
            }
        }
        Ok(())
    }

    /// Dispatch an asynchronous operation: the five standard actions or a
    /// configured custom action.
    pub async fn dispatch(&self, name: &str, payload: Value) -> Result<Value> {
        let (resource_name, op) = split_key(name);
        let resource = self.resource(resource_name)?;
        debug!("dispatch {name}");

        match op {
            Some("fetch") => {
                let params = match payload {
                    Value::Null => None,
                    Value::Object(params) => Some(params),
                    other => {
                        return Err(StoreError::Query(format!(
                            "Fetch parameters must be an object, got `{other}`."
                        )));
                    }
                };
                actions::fetch(self, &resource, params.as_ref()).await
            }
            Some("create") => actions::create(self, &resource, &as_record(payload)?).await,
            Some("update") => actions::update(self, &resource, &as_record(payload)?).await,
            Some("get") => {
                if resource.singleton {
                    actions::fetch(self, &resource, None).await
                } else {
                    let id = RecordId::from_value(&payload)
                        .ok_or_else(|| StoreError::Query(format!("{payload}")))?;
                    actions::get(self, &resource, &id).await
                }
            }
            Some("delete") => {
                let id = RecordId::from_value(&payload);
                actions::delete(self, &resource, id.as_ref()).await
            }
            Some(custom) => {
                let action = resource.actions.get(custom).ok_or_else(|| {
                    StoreError::Config(format!(
                        "Model '{}' has no configuration for '{custom}' option.",
                        resource.name
                    ))
                })?;
                actions::custom(self, &resource, action, payload).await
            }
            None => Err(StoreError::Config(format!(
                "Store has no action '{name}'."
            ))),
        }
    }

    /// Resolve a canonical record by id (or the singleton record).
    pub(crate) fn resolve(&self, resource: &Resource, id: Option<&RecordId>) -> Result<Value> {
        let table = resource.table.read()?;
        if let Some(record) = table.singleton_record() {
            return Ok(Value::Object(record.clone()));
        }
        Ok(id
            .and_then(|id| table.get(id))
            .map(|record| Value::Object(record.clone()))
            .unwrap_or(Value::Null))
    }

    pub(crate) fn sync_record(
        &self,
        resource: &Resource,
        record: Record,
    ) -> Result<Option<RecordId>> {
        let mut table = resource.table.write()?;
        table.sync(&resource.contract, record)
    }

    pub(crate) fn remove_record(&self, resource: &Resource, id: Option<&RecordId>) -> Result<()> {
        let mut table = resource.table.write()?;
        table.remove(&resource.contract, id);
        Ok(())
    }
}

fn split_key(name: &str) -> (&str, Option<&str>) {
    match name.split_once('.') {
        Some((resource, op)) => (resource, Some(op)),
        None => (name, None),
    }
}

pub(crate) fn as_record(value: Value) -> Result<Record> {
    match value {
        Value::Object(record) => Ok(record),
        other => Err(StoreError::Contract(format!(
            "Expected record data, got `{other}`."
        ))),
    }
}

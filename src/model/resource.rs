use std::collections::BTreeMap;

use crate::contract::{FieldSpec, RawContract};
use crate::transport::Method;

/// Endpoint configuration for the five standard operations plus the
/// generic `collection`/`model` fallbacks.
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    pub fetch: Option<String>,
    pub get: Option<String>,
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
    pub collection: Option<String>,
    pub model: Option<String>,
}

impl ApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch(mut self, url: impl Into<String>) -> Self {
        self.fetch = Some(url.into());
        self
    }

    pub fn get(mut self, url: impl Into<String>) -> Self {
        self.get = Some(url.into());
        self
    }

    pub fn create(mut self, url: impl Into<String>) -> Self {
        self.create = Some(url.into());
        self
    }

    pub fn update(mut self, url: impl Into<String>) -> Self {
        self.update = Some(url.into());
        self
    }

    pub fn delete(mut self, url: impl Into<String>) -> Self {
        self.delete = Some(url.into());
        self
    }

    pub fn collection(mut self, url: impl Into<String>) -> Self {
        self.collection = Some(url.into());
        self
    }

    pub fn model(mut self, url: impl Into<String>) -> Self {
        self.model = Some(url.into());
        self
    }
}

/// A custom named action: endpoint plus explicit verb, dispatched as
/// `<resource>.<name>`.
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub endpoint: String,
    pub method: Method,
}

/// Declarative description of one reflected resource.
///
/// This is the whole configuration surface: no model subclassing, just a
/// descriptor passed to store registration.
#[derive(Clone, Default)]
pub struct ResourceConfig {
    pub name: String,
    pub singleton: bool,
    pub api: ApiConfig,
    pub contract: RawContract,
    pub actions: BTreeMap<String, ActionConfig>,
}

impl ResourceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    pub fn field(mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
        self.contract.insert(name.into(), spec.into());
        self
    }

    pub fn action(
        mut self,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        method: Method,
    ) -> Self {
        self.actions.insert(
            name.into(),
            ActionConfig {
                endpoint: endpoint.into(),
                method,
            },
        );
        self
    }
}

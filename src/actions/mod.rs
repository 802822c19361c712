use log::{debug, warn};
use serde_json::Value;

use crate::contract::{format_pull, format_push};
use crate::core::{Record, RecordId, Result, StoreError, record_id};
use crate::model::ActionConfig;
use crate::store::store::{Resource, Store, as_record};
use crate::transport::{Method, TransportResponse};

/// Resolve the first configured endpoint from a priority list of aliases.
fn endpoint(candidates: &[&Option<String>], resource: &Resource, op: &str) -> Result<String> {
    candidates
        .iter()
        .find_map(|candidate| candidate.as_ref().cloned())
        .ok_or_else(|| {
            StoreError::Config(format!(
                "Model '{}' has no configuration for '{op}' option.",
                resource.name
            ))
        })
}

fn with_id(url: &str, id: &RecordId) -> String {
    url.replace(":id", &id.to_string())
}

/// Sorted `?k=v` query string for fetch parameters.
fn query_string(params: &Record) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect();
    pairs.sort();

    let mut out = String::new();
    for (i, (key, value)) in pairs.iter().enumerate() {
        out.push(if i == 0 { '?' } else { '&' });
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out
}

fn check_status(response: &TransportResponse, url: &str) -> Result<()> {
    if response.status >= 400 {
        warn!("request to {url} failed with status {}", response.status);
        return Err(StoreError::Transport(format!(
            "Request to '{url}' failed with status {}.",
            response.status
        )));
    }
    Ok(())
}

/// Pull-format a response record, merge it into the table, and return
/// the resolved canonical value.
fn commit_response(store: &Store, resource: &Resource, data: Value) -> Result<Value> {
    let record = as_record(data)?;
    let pulled = format_pull(&resource.contract, &record);
    let id = store.sync_record(resource, pulled)?;
    store.resolve(resource, id.as_ref())
}

/// Fetch a collection (or the singleton record) and commit it.
pub(crate) async fn fetch(
    store: &Store,
    resource: &Resource,
    params: Option<&Record>,
) -> Result<Value> {
    let mut url = if resource.singleton {
        endpoint(
            &[&resource.api.fetch, &resource.api.get, &resource.api.model],
            resource,
            "fetch",
        )?
    } else {
        endpoint(&[&resource.api.fetch, &resource.api.collection], resource, "fetch")?
    };
    if let Some(params) = params {
        url.push_str(&query_string(params));
    }

    let response = store.transport().call(Method::Get, &url, None).await?;
    check_status(&response, &url)?;

    if resource.singleton {
        return commit_response(store, resource, response.data);
    }

    let Value::Array(items) = response.data else {
        return Err(StoreError::Contract(format!(
            "Expected a collection response for fetch of '{}'.",
            resource.name
        )));
    };

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        results.push(commit_response(store, resource, item)?);
    }
    debug!("fetched {} '{}' records", results.len(), resource.name);
    Ok(Value::Array(results))
}

/// Create a record: push-format, POST, commit the response.
pub(crate) async fn create(store: &Store, resource: &Resource, data: &Record) -> Result<Value> {
    let url = endpoint(
        &[&resource.api.create, &resource.api.collection],
        resource,
        "create",
    )?;
    let payload = format_push(&resource.contract, data)?;

    let response = store
        .transport()
        .call(Method::Post, &url, Some(Value::Object(payload)))
        .await?;
    check_status(&response, &url)?;

    commit_response(store, resource, response.data)
}

/// Retrieve one record by id and commit it.
pub(crate) async fn get(store: &Store, resource: &Resource, id: &RecordId) -> Result<Value> {
    let url = endpoint(&[&resource.api.get, &resource.api.model], resource, "get")?;
    let url = with_id(&url, id);

    let response = store.transport().call(Method::Get, &url, None).await?;
    check_status(&response, &url)?;

    commit_response(store, resource, response.data)
}

/// Update a record: push-format, PUT against the id endpoint, commit.
pub(crate) async fn update(store: &Store, resource: &Resource, data: &Record) -> Result<Value> {
    let url = endpoint(&[&resource.api.update, &resource.api.model], resource, "update")?;

    let url = if resource.singleton {
        url
    } else {
        let id = record_id(data).ok_or_else(|| {
            StoreError::Contract(format!(
                "Update action for model '{}' must include 'id' key.",
                resource.name
            ))
        })?;
        with_id(&url, &id)
    };

    let payload = format_push(&resource.contract, data)?;
    let response = store
        .transport()
        .call(Method::Put, &url, Some(Value::Object(payload)))
        .await?;
    check_status(&response, &url)?;

    commit_response(store, resource, response.data)
}

/// Delete a record and drop it from the table. Singleton deletes reset
/// the record to contract defaults instead.
pub(crate) async fn delete(
    store: &Store,
    resource: &Resource,
    id: Option<&RecordId>,
) -> Result<Value> {
    let url = endpoint(&[&resource.api.delete, &resource.api.model], resource, "delete")?;

    let url = if resource.singleton {
        url
    } else {
        let id = id.ok_or_else(|| {
            StoreError::Contract(format!(
                "Delete action for model '{}' must include 'id' key.",
                resource.name
            ))
        })?;
        with_id(&url, id)
    };

    let response = store.transport().call(Method::Delete, &url, None).await?;
    check_status(&response, &url)?;

    store.remove_record(resource, id)?;
    Ok(Value::Null)
}

/// Dispatch a configured custom action. Object responses are committed
/// like standard operations; anything else is returned untouched.
pub(crate) async fn custom(
    store: &Store,
    resource: &Resource,
    action: &ActionConfig,
    payload: Value,
) -> Result<Value> {
    let mut url = action.endpoint.clone();
    if let Value::Object(data) = &payload
        && let Some(id) = record_id(data)
    {
        url = with_id(&url, &id);
    }

    let body = match action.method {
        Method::Post | Method::Put => match payload {
            Value::Null => None,
            Value::Object(data) => Some(Value::Object(format_push(&resource.contract, &data)?)),
            other => Some(other),
        },
        Method::Get | Method::Delete => None,
    };

    let response = store.transport().call(action.method, &url, body).await?;
    check_status(&response, &url)?;

    match response.data {
        data @ Value::Object(_) => commit_response(store, resource, data),
        Value::Array(items) => {
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                results.push(commit_response(store, resource, item)?);
            }
            Ok(Value::Array(results))
        }
        other => Ok(other),
    }
}

use std::collections::BTreeMap;

use serde_json::Value;

use crate::contract::{Contract, Field};
use crate::core::{Record, Result, StoreError};

/// Render a `${value}`/`${key}` message template.
fn render(template: &str, key: &str, value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => template.replace("${value}", s),
        other => template.replace("${value}", &other.to_string()),
    };
    rendered.replace("${key}", key)
}

/// Full contract template: every field present, defaulted or null.
pub fn template(contract: &Contract) -> Record {
    contract
        .iter()
        .map(|(name, field)| {
            (
                name.clone(),
                field.default.clone().unwrap_or(Value::Null),
            )
        })
        .collect()
}

/// Only the fields that carry an explicit default.
pub fn defaults(contract: &Contract) -> Record {
    contract
        .iter()
        .filter_map(|(name, field)| {
            field
                .default
                .clone()
                .map(|default| (name.clone(), default))
        })
        .collect()
}

/// Format an outbound payload against the contract.
///
/// Applies, per field and in order: required check, nested-object
/// collapse, type coercion, validation, mutation, and `to`-renaming.
/// Returns a fresh payload; the caller's data is never touched.
pub fn format_push(contract: &Contract, data: &Record) -> Result<Record> {
    let mut result = data.clone();

    for (key, field) in contract {
        // required fields must arrive under their own key or their rename
        if field.required {
            let renamed = field.to.as_deref().is_some_and(|to| result.contains_key(to));
            if !result.contains_key(key) && !renamed {
                return Err(StoreError::Contract(format!(
                    "Key `{}` is required for create and update actions.",
                    field.to.as_deref().unwrap_or(key)
                )));
            }
        }

        let Some(mut value) = result.get(key).cloned() else {
            continue;
        };

        if let Some(collapse) = &field.collapse
            && let Value::Object(nested) = &value
        {
            match nested.get(collapse) {
                Some(inner) => value = inner.clone(),
                None => {
                    return Err(StoreError::Collapse {
                        field: key.clone(),
                        key: collapse.clone(),
                    });
                }
            }
        }

        if let Some(field_type) = field.field_type {
            value = field_type.coerce(&value)?;
        }

        if let Some(validate) = &field.validate
            && !(validate.check)(&value)
        {
            return Err(StoreError::Validation(render(&validate.message, key, &value)));
        }

        if let Some(mutate) = &field.mutate {
            value = mutate(value);
        }

        if let Some(to) = &field.to {
            result.remove(key);
            result.insert(to.clone(), value);
        } else {
            result.insert(key.clone(), value);
        }
    }

    Ok(result)
}

/// Format an inbound payload into the canonical record shape.
///
/// Server data is trusted: no required checks and no validation, only
/// `from`-alias resolution, `parse` transforms, and default imputation.
/// Every contract key ends up present; unknown keys pass through.
pub fn format_pull(contract: &Contract, data: &Record) -> Record {
    // reverse-alias map: wire name -> canonical name
    let aliases: BTreeMap<&str, &str> = contract
        .iter()
        .map(|(name, field)| {
            (
                field.from.as_deref().or(field.to.as_deref()).unwrap_or(name),
                name.as_str(),
            )
        })
        .collect();

    let mut result = template(contract);

    for (key, value) in data {
        let target = aliases.get(key.as_str()).copied().unwrap_or(key.as_str());
        let value = match contract.get(target).and_then(|f| f.parse.as_ref()) {
            Some(parse) => parse(value.clone()),
            None => value.clone(),
        };
        result.insert(target.to_string(), value);
    }

    result
}

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::core::{Result, StoreError};

/// Transform applied to a single field value (push `mutate` / pull `parse`).
pub type Mutator = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Predicate used by field validation.
pub type Check = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Validation rule: predicate plus a `${value}`/`${key}` message template.
#[derive(Clone)]
pub struct Validate {
    pub check: Check,
    pub message: String,
}

pub const DEFAULT_VALIDATE_MESSAGE: &str =
    "Value `${value}` for key `${key}` did not pass validation.";

impl Validate {
    pub fn new<F>(check: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
            message: message.into(),
        }
    }
}

impl fmt::Debug for Validate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validate")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Type tags for explicit field coercion.
///
/// Coercion is a function registry keyed by this enum rather than any
/// implicit constructor call: each tag knows how to convert the JSON
/// values it accepts and rejects everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Float,
    Text,
    Boolean,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
        }
    }

    /// Coerce a value to this type. Null always passes through untouched.
    pub fn coerce(&self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            Self::Integer => match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .map(Value::from)
                    .ok_or_else(|| self.mismatch(value)),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| self.mismatch(value)),
                Value::Bool(b) => Ok(Value::from(i64::from(*b))),
                _ => Err(self.mismatch(value)),
            },
            Self::Float => match value {
                Value::Number(n) => n
                    .as_f64()
                    .map(Value::from)
                    .ok_or_else(|| self.mismatch(value)),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::from)
                    .map_err(|_| self.mismatch(value)),
                _ => Err(self.mismatch(value)),
            },
            Self::Text => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::from(n.to_string())),
                Value::Bool(b) => Ok(Value::from(b.to_string())),
                _ => Err(self.mismatch(value)),
            },
            Self::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::from(n.as_f64() != Some(0.0))),
                Value::String(s) => match s.as_str() {
                    "true" => Ok(Value::from(true)),
                    "false" => Ok(Value::from(false)),
                    _ => Err(self.mismatch(value)),
                },
                _ => Err(self.mismatch(value)),
            },
        }
    }

    fn mismatch(&self, value: &Value) -> StoreError {
        StoreError::Validation(format!(
            "Cannot coerce value `{value}` to type {}",
            self.name()
        ))
    }
}

/// Canonical per-field descriptor produced by contract normalization.
#[derive(Clone, Default)]
pub struct Field {
    pub default: Option<Value>,
    pub required: bool,
    pub from: Option<String>,
    pub to: Option<String>,
    pub field_type: Option<FieldType>,
    pub validate: Option<Validate>,
    pub mutate: Option<Mutator>,
    pub parse: Option<Mutator>,
    pub collapse: Option<String>,
    pub relation: Option<String>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("default", &self.default)
            .field("required", &self.required)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("field_type", &self.field_type)
            .field("validate", &self.validate.is_some())
            .field("mutate", &self.mutate.is_some())
            .field("parse", &self.parse.is_some())
            .field("collapse", &self.collapse)
            .field("relation", &self.relation)
            .finish()
    }
}

impl Field {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn from(mut self, name: impl Into<String>) -> Self {
        self.from = Some(name.into());
        self
    }

    pub fn to(mut self, name: impl Into<String>) -> Self {
        self.to = Some(name.into());
        self
    }

    pub fn of_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn validate<F>(mut self, check: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validate = Some(Validate::new(check, message));
        self
    }

    /// Validation with the stock failure message.
    pub fn check<F>(self, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validate(check, DEFAULT_VALIDATE_MESSAGE)
    }

    pub fn mutate<F>(mut self, mutate: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.mutate = Some(Arc::new(mutate));
        self
    }

    pub fn parse<F>(mut self, parse: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(parse));
        self
    }

    pub fn collapse(mut self, key: impl Into<String>) -> Self {
        self.collapse = Some(key.into());
        self
    }

    pub fn relation(mut self, resource: impl Into<String>) -> Self {
        self.relation = Some(resource.into());
        self
    }
}

/// Canonical contract: field name → canonical descriptor.
pub type Contract = BTreeMap<String, Field>;

/// Whether to collapse a nested object, and under which key.
///
/// `Flag(true)` is the historical shorthand for collapsing on `"id"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollapseSpec {
    Flag(bool),
    Key(String),
}

impl From<bool> for CollapseSpec {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<&str> for CollapseSpec {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

/// Heterogeneous per-field configuration accepted from callers.
///
/// Either a bare default value or a full descriptor. Descriptors may use
/// the historical option names (`validation`, `mutation`, `model`,
/// boolean `collapse`); normalization folds them onto the canonical slots.
#[derive(Clone, Default)]
pub struct FieldConfig {
    pub default: Option<Value>,
    pub required: bool,
    pub from: Option<String>,
    pub to: Option<String>,
    pub field_type: Option<FieldType>,
    pub validate: Option<Validate>,
    pub validation: Option<Validate>,
    pub mutate: Option<Mutator>,
    pub mutation: Option<Mutator>,
    pub parse: Option<Mutator>,
    pub collapse: Option<CollapseSpec>,
    pub relation: Option<String>,
    pub model: Option<String>,
}

#[derive(Clone)]
pub enum FieldSpec {
    /// Shorthand: the bare value is the field default.
    Default(Value),
    Descriptor(Box<FieldConfig>),
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default(value) => f.debug_tuple("Default").field(value).finish(),
            Self::Descriptor(_) => f.write_str("Descriptor(..)"),
        }
    }
}

impl From<Value> for FieldSpec {
    fn from(value: Value) -> Self {
        Self::Default(value)
    }
}

impl From<FieldConfig> for FieldSpec {
    fn from(config: FieldConfig) -> Self {
        Self::Descriptor(Box::new(config))
    }
}

impl From<Field> for FieldSpec {
    fn from(field: Field) -> Self {
        Self::Descriptor(Box::new(FieldConfig {
            default: field.default,
            required: field.required,
            from: field.from,
            to: field.to,
            field_type: field.field_type,
            validate: field.validate,
            validation: None,
            mutate: field.mutate,
            mutation: None,
            parse: field.parse,
            collapse: field.collapse.map(CollapseSpec::Key),
            relation: field.relation,
            model: None,
        }))
    }
}

/// Caller-shaped contract: field name → raw specification.
pub type RawContract = BTreeMap<String, FieldSpec>;

/// Normalize a heterogeneous contract into its canonical descriptor set.
///
/// Pure transform: the caller's configuration is left untouched, and
/// normalizing an already-canonical contract changes nothing.
pub fn normalize(raw: &RawContract) -> Contract {
    raw.iter()
        .map(|(name, spec)| (name.clone(), normalize_field(spec)))
        .collect()
}

fn normalize_field(spec: &FieldSpec) -> Field {
    match spec {
        FieldSpec::Default(value) => Field {
            default: Some(value.clone()),
            ..Field::default()
        },
        FieldSpec::Descriptor(config) => Field {
            default: config.default.clone(),
            required: config.required,
            from: config.from.clone(),
            to: config.to.clone(),
            field_type: config.field_type,
            validate: config.validate.clone().or_else(|| config.validation.clone()),
            mutate: config.mutate.clone().or_else(|| config.mutation.clone()),
            parse: config.parse.clone(),
            collapse: match &config.collapse {
                Some(CollapseSpec::Flag(true)) => Some("id".to_string()),
                Some(CollapseSpec::Flag(false)) | None => None,
                Some(CollapseSpec::Key(key)) => Some(key.clone()),
            },
            relation: config.relation.clone().or_else(|| config.model.clone()),
        },
    }
}

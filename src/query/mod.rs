use std::cmp::Ordering;

use rand::seq::SliceRandom;
use regex::Regex;
use serde_json::Value;

use crate::core::{Record, value_cmp};

type Predicate = Box<dyn Fn(&Record) -> bool>;
type Comparator = Box<dyn Fn(&Record, &Record) -> Ordering>;

/// Filter argument: an arbitrary predicate, a field-equality map, or a
/// field→pattern map.
pub enum FilterSpec {
    Predicate(Predicate),
    Fields(Record),
    Patterns(Vec<(String, Regex)>),
}

impl FilterSpec {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Record) -> bool + 'static,
    {
        Self::Predicate(Box::new(f))
    }

    fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Predicate(f) => f(record),
            Self::Fields(fields) => fields
                .iter()
                .all(|(key, expected)| record.get(key) == Some(expected)),
            Self::Patterns(patterns) => patterns.iter().all(|(key, pattern)| {
                record
                    .get(key)
                    .and_then(Value::as_str)
                    .is_some_and(|s| pattern.is_match(s))
            }),
        }
    }
}

impl From<Record> for FilterSpec {
    fn from(fields: Record) -> Self {
        Self::Fields(fields)
    }
}

impl From<Value> for FilterSpec {
    fn from(fields: Value) -> Self {
        Self::Fields(fields.as_object().cloned().unwrap_or_default())
    }
}

impl From<Vec<(String, Regex)>> for FilterSpec {
    fn from(patterns: Vec<(String, Regex)>) -> Self {
        Self::Patterns(patterns)
    }
}

impl From<(&str, Regex)> for FilterSpec {
    fn from((field, pattern): (&str, Regex)) -> Self {
        Self::Patterns(vec![(field.to_string(), pattern)])
    }
}

/// Ordering argument: one field (`-` prefix for descending), several
/// fields, or a full comparator.
pub enum OrderSpec {
    Field(String),
    Fields(Vec<String>),
    Comparator(Comparator),
}

impl OrderSpec {
    pub fn comparator<F>(f: F) -> Self
    where
        F: Fn(&Record, &Record) -> Ordering + 'static,
    {
        Self::Comparator(Box::new(f))
    }
}

impl From<&str> for OrderSpec {
    fn from(field: &str) -> Self {
        Self::Field(field.to_string())
    }
}

impl From<Vec<&str>> for OrderSpec {
    fn from(fields: Vec<&str>) -> Self {
        Self::Fields(fields.iter().map(|f| f.to_string()).collect())
    }
}

fn field_cmp(a: &Record, b: &Record, field: &str) -> Ordering {
    let (field, reversed) = match field.strip_prefix('-') {
        Some(field) => (field, true),
        None => (field, false),
    };
    let ordering = value_cmp(
        a.get(field).unwrap_or(&Value::Null),
        b.get(field).unwrap_or(&Value::Null),
    );
    if reversed { ordering.reverse() } else { ordering }
}

/// Fluent resolver over an already-materialized collection of records.
///
/// Refinements consume and return the query; terminals resolve it.
pub struct Query {
    records: Vec<Record>,
}

impl Query {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn filter(mut self, spec: impl Into<FilterSpec>) -> Self {
        let spec = spec.into();
        self.records.retain(|record| spec.matches(record));
        self
    }

    /// Keep records where the field is present and non-null.
    pub fn has(mut self, field: &str) -> Self {
        self.records
            .retain(|record| record.get(field).is_some_and(|v| !v.is_null()));
        self
    }

    pub fn offset(mut self, n: usize) -> Self {
        self.records = self.records.split_off(n.min(self.records.len()));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.records.truncate(n);
        self
    }

    pub fn order(mut self, spec: impl Into<OrderSpec>) -> Self {
        match spec.into() {
            OrderSpec::Field(field) => {
                self.records.sort_by(|a, b| field_cmp(a, b, &field));
            }
            OrderSpec::Fields(fields) => {
                self.records.sort_by(|a, b| {
                    fields
                        .iter()
                        .map(|field| field_cmp(a, b, field))
                        .find(|ordering| *ordering != Ordering::Equal)
                        .unwrap_or(Ordering::Equal)
                });
            }
            OrderSpec::Comparator(comparator) => self.records.sort_by(|a, b| comparator(a, b)),
        }
        self
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn all(self) -> Vec<Record> {
        self.records
    }

    pub fn first(self) -> Option<Record> {
        self.records.into_iter().next()
    }

    pub fn last(mut self) -> Option<Record> {
        self.records.pop()
    }

    /// Exactly one match, or nothing.
    pub fn one(self) -> Option<Record> {
        if self.records.len() == 1 {
            self.records.into_iter().next()
        } else {
            None
        }
    }

    /// Uniform random sample without replacement.
    pub fn sample(self, n: usize) -> Vec<Record> {
        let mut rng = rand::thread_rng();
        self.records
            .choose_multiple(&mut rng, n)
            .cloned()
            .collect()
    }
}

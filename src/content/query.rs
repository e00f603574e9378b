//! Delivery API query builder
//!
//! Builds the JSON `query` parameter understood by the CMS delivery API plus
//! the ordering and pagination parameters that travel next to it.

use serde_json::{Map, Value};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    /// Name of the URL parameter carrying the sort field
    pub fn param(&self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

/// Filter, order and page of an entries request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    conditions: Map<String, Value>,
    order: Option<(String, Order)>,
    limit: Option<u32>,
    skip: Option<u32>,
    include_count: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// `field == value`
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.to_string(), value.into());
        self
    }

    fn operator(mut self, field: &str, op: &str, value: Value) -> Self {
        let entry = self
            .conditions
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(ops) = entry {
            ops.insert(op.to_string(), value);
        }
        self
    }

    /// `field > value`
    pub fn greater_than(self, field: &str, value: impl Into<Value>) -> Self {
        self.operator(field, "$gt", value.into())
    }

    /// `field < value`
    pub fn less_than(self, field: &str, value: impl Into<Value>) -> Self {
        self.operator(field, "$lt", value.into())
    }

    /// Case-insensitive regular expression match on `field`
    pub fn regex(self, field: &str, pattern: &str) -> Self {
        self.operator(field, "$regex", Value::String(pattern.to_string()))
            .operator(field, "$options", Value::String("i".to_string()))
    }

    pub fn ascending(mut self, field: &str) -> Self {
        self.order = Some((field.to_string(), Order::Ascending));
        self
    }

    pub fn descending(mut self, field: &str) -> Self {
        self.order = Some((field.to_string(), Order::Descending));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn include_count(mut self) -> Self {
        self.include_count = true;
        self
    }

    pub fn conditions(&self) -> &Map<String, Value> {
        &self.conditions
    }

    pub fn order(&self) -> Option<(&str, Order)> {
        self.order.as_ref().map(|(f, o)| (f.as_str(), *o))
    }

    pub fn get_limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn get_skip(&self) -> u32 {
        self.skip.unwrap_or(0)
    }

    pub fn wants_count(&self) -> bool {
        self.include_count
    }

    /// The filter as the JSON object sent in `query`
    pub fn to_json(&self) -> Value {
        Value::Object(self.conditions.clone())
    }

    /// URL parameters of the request, `environment` excluded
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if !self.conditions.is_empty() {
            params.push(("query".to_string(), self.to_json().to_string()));
        }
        if let Some((field, order)) = &self.order {
            params.push((order.param().to_string(), field.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(skip) = self.skip {
            params.push(("skip".to_string(), skip.to_string()));
        }
        if self.include_count {
            params.push(("include_count".to_string(), "true".to_string()));
        }
        params
    }
}

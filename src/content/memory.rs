//! In-memory content store
//!
//! Evaluates the same queries as the delivery API against entries held in
//! memory. Backs the bundled sample catalog and the tests.
//!
//! Supported conditions:
//! - plain equality (arrays match when any element, or its `uid`, is equal)
//! - `$gt` / `$lt` on numbers and strings
//! - `$regex` with `$options: "i"`

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::RegexBuilder;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use super::query::{Order, Query};
use super::store::{ContentError, ContentStore, Entries};
use crate::models::TaxonomyItem;

/// Serialized form accepted by [`MemoryStore::from_json`]
#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    content_types: HashMap<String, Vec<Value>>,
    #[serde(default)]
    taxonomies: HashMap<String, Vec<TaxonomyItem>>,
}

/// Content store over in-memory entries
pub struct MemoryStore {
    content_types: RwLock<HashMap<String, Vec<Value>>>,
    taxonomies: RwLock<HashMap<String, Vec<TaxonomyItem>>>,
    configured: bool,
    requests: AtomicUsize,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types = self
            .content_types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("MemoryStore")
            .field("content_types", &types)
            .field("configured", &self.configured)
            .field("requests", &self.requests.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            content_types: RwLock::new(HashMap::new()),
            taxonomies: RwLock::new(HashMap::new()),
            configured: true,
            requests: AtomicUsize::new(0),
        }
    }

    /// A store that answers every call with `NotConfigured`
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    /// Load `{"content_types": {...}, "taxonomies": {...}}`
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(json).context("Failed to parse content snapshot")?;
        Ok(Self {
            content_types: RwLock::new(snapshot.content_types),
            taxonomies: RwLock::new(snapshot.taxonomies),
            ..Self::new()
        })
    }

    pub fn insert(&self, content_type: &str, entry: Value) {
        self.content_types
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(content_type.to_string())
            .or_default()
            .push(entry);
    }

    pub fn insert_terms(&self, taxonomy_uid: &str, terms: Vec<TaxonomyItem>) {
        self.taxonomies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(taxonomy_uid.to_string(), terms);
    }

    /// Number of calls answered so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), ContentError> {
        if !self.configured {
            return Err(ContentError::NotConfigured);
        }
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn field<'a>(entry: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(entry, |value, key| value.get(key))
}

fn equals(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
        return a == b;
    }
    match actual {
        Value::Array(items) => items
            .iter()
            .any(|item| item == expected || item.get("uid") == Some(expected)),
        Value::Object(_) => actual.get("uid") == Some(expected),
        _ => false,
    }
}

fn compare(a: &Value, b: &Value) -> Option<CmpOrdering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn matches_operators(actual: Option<&Value>, ops: &Map<String, Value>) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    ops.iter().all(|(op, expected)| match op.as_str() {
        "$gt" => compare(actual, expected) == Some(CmpOrdering::Greater),
        "$lt" => compare(actual, expected) == Some(CmpOrdering::Less),
        "$regex" => {
            let case_insensitive = ops
                .get("$options")
                .and_then(Value::as_str)
                .is_some_and(|o| o.contains('i'));
            let (Some(pattern), Some(text)) = (expected.as_str(), actual.as_str()) else {
                return false;
            };
            RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
                .map(|re| re.is_match(text))
                .unwrap_or(false)
        }
        "$options" => true,
        _ => false,
    })
}

fn matches(entry: &Value, conditions: &Map<String, Value>) -> bool {
    conditions.iter().all(|(path, condition)| match condition {
        Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
            matches_operators(field(entry, path), ops)
        }
        expected => field(entry, path).is_some_and(|actual| equals(actual, expected)),
    })
}

/// Missing values sort after present ones in either direction
fn sort_entries(entries: &mut [Value], path: &str, order: Order) {
    entries.sort_by(|a, b| match (field(a, path), field(b, path)) {
        (Some(x), Some(y)) => {
            let ord = compare(x, y).unwrap_or(CmpOrdering::Equal);
            match order {
                Order::Ascending => ord,
                Order::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    });
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn find(&self, content_type: &str, query: &Query) -> Result<Entries, ContentError> {
        self.begin()?;
        let mut matched: Vec<Value> = self
            .content_types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(content_type)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| matches(entry, query.conditions()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((path, order)) = query.order() {
            sort_entries(&mut matched, path, order);
        }

        let total = matched.len() as u64;
        let skip = query.get_skip() as usize;
        let limit = query.get_limit().map(|l| l as usize).unwrap_or(usize::MAX);
        let entries = matched.into_iter().skip(skip).take(limit).collect();

        Ok(Entries {
            entries,
            count: query.wants_count().then_some(total),
        })
    }

    async fn fetch_entry(&self, content_type: &str, uid: &str) -> Result<Option<Value>, ContentError> {
        self.begin()?;
        Ok(self
            .content_types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(content_type)
            .and_then(|entries| {
                entries
                    .iter()
                    .find(|entry| entry.get("uid").and_then(Value::as_str) == Some(uid))
                    .cloned()
            }))
    }

    async fn taxonomy_terms(&self, taxonomy_uid: &str) -> Result<Vec<TaxonomyItem>, ContentError> {
        self.begin()?;
        Ok(self
            .taxonomies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(taxonomy_uid)
            .cloned()
            .unwrap_or_default())
    }
}

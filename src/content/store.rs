//! Content store abstraction
//!
//! Provides a unified interface over the CMS delivery API and the in-memory
//! store used for sample data.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::query::Query;
use crate::models::TaxonomyItem;

/// Content store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("Content provider is not configured")]
    NotConfigured,

    #[error("Content provider returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Content provider unreachable: {0}")]
    Network(String),

    #[error("Unreadable content: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ContentError {
    fn from(e: reqwest::Error) -> Self {
        ContentError::Network(e.to_string())
    }
}

/// Raw entries matched by a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entries {
    pub entries: Vec<Value>,
    /// Total matches, when the query asked for a count
    pub count: Option<u64>,
}

/// Read access to published content
#[async_trait]
pub trait ContentStore: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Entries of `content_type` matching `query`
    async fn find(&self, content_type: &str, query: &Query) -> Result<Entries, ContentError>;

    /// One entry by uid, `None` when it does not exist
    async fn fetch_entry(&self, content_type: &str, uid: &str) -> Result<Option<Value>, ContentError>;

    /// Terms of a taxonomy
    async fn taxonomy_terms(&self, taxonomy_uid: &str) -> Result<Vec<TaxonomyItem>, ContentError>;
}

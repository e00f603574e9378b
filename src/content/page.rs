//! Result shapes of content queries

use serde::Serialize;

/// One page of a listing
///
/// `has_more` is derived from the other fields on construction and always
/// equals `skip + items.len() < total`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    items: Vec<T>,
    total: u64,
    limit: u32,
    skip: u32,
    has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, limit: u32, skip: u32) -> Self {
        let has_more = u64::from(skip) + (items.len() as u64) < total;
        Self {
            items,
            total,
            limit,
            skip,
            has_more,
        }
    }

    pub fn empty(limit: u32, skip: u32) -> Self {
        Self::new(Vec::new(), 0, limit, skip)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn skip(&self) -> u32 {
        self.skip
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page::new(
            self.items.into_iter().map(f).collect(),
            self.total,
            self.limit,
            self.skip,
        )
    }
}

/// Outcome of a content call
///
/// Keeps "nothing there", "could not ask" and "not set up" apart so callers
/// can decide what to show for each.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Fetched<T> {
    Ready(T),
    /// The query matched nothing
    Empty,
    /// The provider failed or answered with something unreadable
    Failed(String),
    /// No credentials for the provider; no request was made
    NotConfigured,
}

impl<T> Fetched<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Fetched::Ready(_))
    }

    pub fn is_not_configured(&self) -> bool {
        matches!(self, Fetched::NotConfigured)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Fetched::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Fetched::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Ready(value) => Fetched::Ready(f(value)),
            Fetched::Empty => Fetched::Empty,
            Fetched::Failed(reason) => Fetched::Failed(reason),
            Fetched::NotConfigured => Fetched::NotConfigured,
        }
    }
}

impl<T> Fetched<Page<T>> {
    /// The page, or the uniform empty page for every other outcome
    pub fn into_page(self, limit: u32, skip: u32) -> Page<T> {
        match self {
            Fetched::Ready(page) => page,
            _ => Page::empty(limit, skip),
        }
    }

    /// Items of the page, empty for every other outcome
    pub fn into_items(self) -> Vec<T> {
        self.ready().map(Page::into_items).unwrap_or_default()
    }
}

impl<T> Fetched<Vec<T>> {
    pub fn into_vec(self) -> Vec<T> {
        self.ready().unwrap_or_default()
    }
}

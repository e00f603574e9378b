//! Catalog service
//!
//! Typed reads of cars, variants, reviews, news, taxonomies and the layout
//! singletons. Every call answers with a [`Fetched`] and never fails:
//! provider errors become `Failed`, missing credentials `NotConfigured`
//! (without any request), and nothing found `Empty`.
//!
//! When built with a fallback store, calls the primary store answers with
//! `NotConfigured` are served from the fallback instead.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::page::{Fetched, Page};
use super::params::{
    CarParams, CarSort, NewsParams, NewsSort, ReviewParams, ReviewSort, BANNER, CAR, CAR_VARIANT,
    FOOTER, HEADER, NEWS, REVIEW,
};
use super::query::Query;
use super::store::{ContentError, ContentStore, Entries};
use crate::models::{
    BannerEntry, CarEntry, CarVariant, FooterEntry, HeaderEntry, NewsCategory, NewsEntry,
    ReviewEntry, TaxonomyItem,
};

pub const FEATURED_CARS_LIMIT: u32 = 6;
pub const FEATURED_REVIEWS_LIMIT: u32 = 6;
pub const FEATURED_NEWS_LIMIT: u32 = 4;
pub const BREAKING_NEWS_LIMIT: u32 = 3;
pub const NEWS_BY_CATEGORY_LIMIT: u32 = 10;
pub const SEARCH_LIMIT: u32 = 10;
/// Cars scanned when deriving brand and city lists
pub const FACET_SCAN_LIMIT: u32 = 100;

/// Read access to the published catalog
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn ContentStore>,
    fallback: Option<Arc<dyn ContentStore>>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("configured", &self.store.is_configured())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

fn decode_all<T: DeserializeOwned>(entries: Vec<Value>) -> Result<Vec<T>, ContentError> {
    entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).map_err(|e| ContentError::Decode(e.to_string())))
        .collect()
}

fn decode_one<T: DeserializeOwned>(entry: Value) -> Result<T, ContentError> {
    serde_json::from_value(entry).map_err(|e| ContentError::Decode(e.to_string()))
}

/// Outcome of a failed call, logged the same way everywhere
fn failure<T>(what: &str, error: ContentError) -> Fetched<T> {
    match error {
        ContentError::NotConfigured => {
            debug!("{}: content provider not configured", what);
            Fetched::NotConfigured
        }
        other => {
            warn!("{}: {}", what, other);
            Fetched::Failed(other.to_string())
        }
    }
}

fn non_empty<T>(items: Vec<T>) -> Fetched<Vec<T>> {
    if items.is_empty() {
        Fetched::Empty
    } else {
        Fetched::Ready(items)
    }
}

fn found<T>(item: Option<T>) -> Fetched<T> {
    item.map_or(Fetched::Empty, Fetched::Ready)
}

/// Distinct non-empty values in ascending order
fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Catalog {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            fallback: None,
        }
    }

    /// Serve `NotConfigured` calls from `fallback`
    pub fn with_fallback(mut self, fallback: Arc<dyn ContentStore>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_configured()
    }

    async fn find(&self, content_type: &str, query: &Query) -> Result<Entries, ContentError> {
        match self.store.find(content_type, query).await {
            Err(ContentError::NotConfigured) => match &self.fallback {
                Some(fallback) => fallback.find(content_type, query).await,
                None => Err(ContentError::NotConfigured),
            },
            other => other,
        }
    }

    async fn fetch_entry(&self, content_type: &str, uid: &str) -> Result<Option<Value>, ContentError> {
        match self.store.fetch_entry(content_type, uid).await {
            Err(ContentError::NotConfigured) => match &self.fallback {
                Some(fallback) => fallback.fetch_entry(content_type, uid).await,
                None => Err(ContentError::NotConfigured),
            },
            other => other,
        }
    }

    async fn list<T: DeserializeOwned>(&self, content_type: &str, query: &Query) -> Result<Vec<T>, ContentError> {
        decode_all(self.find(content_type, query).await?.entries)
    }

    async fn page<T: DeserializeOwned>(&self, what: &str, content_type: &str, query: Query) -> Fetched<Page<T>> {
        let limit = query.get_limit().unwrap_or(0);
        let skip = query.get_skip();
        let result = async {
            let found = self.find(content_type, &query).await?;
            let count = found.count;
            let items: Vec<T> = decode_all(found.entries)?;
            let total = count.unwrap_or(items.len() as u64);
            Ok::<_, ContentError>(Page::new(items, total, limit, skip))
        }
        .await;

        match result {
            // Past the last page is still a page of a non-empty listing
            Ok(page) if page.total() == 0 => Fetched::Empty,
            Ok(page) => Fetched::Ready(page),
            Err(e) => failure(what, e),
        }
    }

    async fn vec<T: DeserializeOwned>(&self, what: &str, content_type: &str, query: Query) -> Fetched<Vec<T>> {
        match self.list(content_type, &query).await {
            Ok(items) => non_empty(items),
            Err(e) => failure(what, e),
        }
    }

    async fn by_slug<T: DeserializeOwned>(&self, what: &str, content_type: &str, slug: &str) -> Fetched<T> {
        let query = Query::new().where_eq("slug", slug).limit(1);
        match self.list(content_type, &query).await {
            Ok(items) => found(items.into_iter().next()),
            Err(e) => failure(what, e),
        }
    }

    async fn by_uid<T: DeserializeOwned>(&self, what: &str, content_type: &str, uid: &str) -> Fetched<T> {
        let result = match self.fetch_entry(content_type, uid).await {
            Ok(Some(entry)) => decode_one(entry).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };
        match result {
            Ok(item) => found(item),
            Err(e) => failure(what, e),
        }
    }

    /// Slug first, then uid
    async fn resolve<T: DeserializeOwned>(&self, what: &str, content_type: &str, id: &str) -> Fetched<T> {
        match self.by_slug(what, content_type, id).await {
            Fetched::Ready(item) => Fetched::Ready(item),
            Fetched::NotConfigured => Fetched::NotConfigured,
            by_slug => match self.by_uid(what, content_type, id).await {
                Fetched::Empty => by_slug,
                by_uid => by_uid,
            },
        }
    }

    async fn singleton<T: DeserializeOwned>(&self, what: &str, content_type: &str) -> Fetched<T> {
        match self.list(content_type, &Query::new().limit(1)).await {
            Ok(items) => found(items.into_iter().next()),
            Err(e) => failure(what, e),
        }
    }

    // Cars

    pub async fn fetch_cars(&self, params: &CarParams) -> Fetched<Page<CarEntry>> {
        self.page("fetch_cars", CAR, params.to_query()).await
    }

    pub async fn car_by_slug(&self, slug: &str) -> Fetched<CarEntry> {
        self.by_slug("car_by_slug", CAR, slug).await
    }

    pub async fn car_by_uid(&self, uid: &str) -> Fetched<CarEntry> {
        self.by_uid("car_by_uid", CAR, uid).await
    }

    /// Car by slug, or by uid when no slug matches
    pub async fn resolve_car(&self, id: &str) -> Fetched<CarEntry> {
        self.resolve("resolve_car", CAR, id).await
    }

    pub async fn car_variants(&self, car_uid: &str) -> Fetched<Vec<CarVariant>> {
        let query = Query::new().where_eq("car_reference", car_uid);
        self.vec("car_variants", CAR_VARIANT, query).await
    }

    pub async fn featured_cars(&self) -> Fetched<Vec<CarEntry>> {
        let params = CarParams {
            is_featured: true,
            sort: CarSort::Newest,
            limit: FEATURED_CARS_LIMIT,
            ..CarParams::default()
        };
        self.fetch_cars(&params).await.map(Page::into_items)
    }

    /// Case-insensitive title search
    pub async fn search_cars(&self, term: &str) -> Fetched<Vec<CarEntry>> {
        let term = term.trim();
        if term.is_empty() {
            return Fetched::Empty;
        }
        let query = Query::new()
            .regex("title", &regex::escape(term))
            .limit(SEARCH_LIMIT);
        self.vec("search_cars", CAR, query).await
    }

    async fn facet_scan(&self) -> Fetched<Vec<CarEntry>> {
        let params = CarParams {
            limit: FACET_SCAN_LIMIT,
            ..CarParams::default()
        };
        self.fetch_cars(&params).await.map(Page::into_items)
    }

    /// Distinct brands of the first hundred cars, sorted
    pub async fn brands(&self) -> Fetched<Vec<String>> {
        match self.facet_scan().await {
            Fetched::Ready(cars) => non_empty(distinct_sorted(cars.iter().map(|c| c.brand.as_str()))),
            other => other.map(|_| Vec::new()),
        }
    }

    /// Distinct cities of the first hundred cars, sorted
    pub async fn cities(&self) -> Fetched<Vec<String>> {
        match self.facet_scan().await {
            Fetched::Ready(cars) => non_empty(distinct_sorted(
                cars.iter().filter_map(|c| c.city.as_deref()),
            )),
            other => other.map(|_| Vec::new()),
        }
    }

    pub async fn taxonomy(&self, taxonomy_uid: &str) -> Fetched<Vec<TaxonomyItem>> {
        let result = match self.store.taxonomy_terms(taxonomy_uid).await {
            Err(ContentError::NotConfigured) => match &self.fallback {
                Some(fallback) => fallback.taxonomy_terms(taxonomy_uid).await,
                None => Err(ContentError::NotConfigured),
            },
            other => other,
        };
        match result {
            Ok(terms) => non_empty(terms),
            Err(e) => failure("taxonomy", e),
        }
    }

    // Reviews

    pub async fn fetch_reviews(&self, params: &ReviewParams) -> Fetched<Page<ReviewEntry>> {
        self.page("fetch_reviews", REVIEW, params.to_query()).await
    }

    pub async fn review_by_slug(&self, slug: &str) -> Fetched<ReviewEntry> {
        self.by_slug("review_by_slug", REVIEW, slug).await
    }

    pub async fn review_by_uid(&self, uid: &str) -> Fetched<ReviewEntry> {
        self.by_uid("review_by_uid", REVIEW, uid).await
    }

    pub async fn resolve_review(&self, id: &str) -> Fetched<ReviewEntry> {
        self.resolve("resolve_review", REVIEW, id).await
    }

    pub async fn featured_reviews(&self) -> Fetched<Vec<ReviewEntry>> {
        let params = ReviewParams {
            is_featured: true,
            sort: ReviewSort::Newest,
            limit: FEATURED_REVIEWS_LIMIT,
            ..ReviewParams::default()
        };
        self.fetch_reviews(&params).await.map(Page::into_items)
    }

    // News

    pub async fn fetch_news(&self, params: &NewsParams) -> Fetched<Page<NewsEntry>> {
        self.page("fetch_news", NEWS, params.to_query()).await
    }

    pub async fn news_by_slug(&self, slug: &str) -> Fetched<NewsEntry> {
        self.by_slug("news_by_slug", NEWS, slug).await
    }

    pub async fn news_by_uid(&self, uid: &str) -> Fetched<NewsEntry> {
        self.by_uid("news_by_uid", NEWS, uid).await
    }

    pub async fn resolve_news(&self, id: &str) -> Fetched<NewsEntry> {
        self.resolve("resolve_news", NEWS, id).await
    }

    pub async fn featured_news(&self) -> Fetched<Vec<NewsEntry>> {
        let params = NewsParams {
            is_featured: Some(true),
            sort: NewsSort::Newest,
            limit: FEATURED_NEWS_LIMIT,
            ..NewsParams::default()
        };
        self.fetch_news(&params).await.map(Page::into_items)
    }

    pub async fn breaking_news(&self) -> Fetched<Vec<NewsEntry>> {
        let params = NewsParams {
            is_breaking: Some(true),
            sort: NewsSort::Newest,
            limit: BREAKING_NEWS_LIMIT,
            ..NewsParams::default()
        };
        self.fetch_news(&params).await.map(Page::into_items)
    }

    pub async fn news_by_category(&self, category: NewsCategory) -> Fetched<Vec<NewsEntry>> {
        let params = NewsParams {
            category: Some(category),
            sort: NewsSort::Newest,
            limit: NEWS_BY_CATEGORY_LIMIT,
            ..NewsParams::default()
        };
        self.fetch_news(&params).await.map(Page::into_items)
    }

    // Layout

    pub async fn header(&self) -> Fetched<HeaderEntry> {
        self.singleton("header", HEADER).await
    }

    pub async fn footer(&self) -> Fetched<FooterEntry> {
        self.singleton("footer", FOOTER).await
    }

    pub async fn banner(&self) -> Fetched<BannerEntry> {
        self.singleton("banner", BANNER).await
    }
}

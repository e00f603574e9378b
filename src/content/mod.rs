//! Content query layer
//!
//! Typed reads of the published catalog from the CMS delivery API, or from
//! the bundled sample catalog when the CMS is not set up.

mod catalog;
mod delivery;
mod memory;
mod page;
mod params;
mod query;
mod sample;
mod sequence;
mod store;

pub use catalog::{
    Catalog, BREAKING_NEWS_LIMIT, FACET_SCAN_LIMIT, FEATURED_CARS_LIMIT, FEATURED_NEWS_LIMIT,
    FEATURED_REVIEWS_LIMIT, NEWS_BY_CATEGORY_LIMIT, SEARCH_LIMIT,
};
pub use delivery::DeliveryClient;
pub use memory::MemoryStore;
pub use page::{Fetched, Page};
pub use params::{
    CarParams, CarSort, NewsParams, NewsSort, ReviewParams, ReviewSort, DEFAULT_CAR_LIMIT,
    DEFAULT_NEWS_LIMIT, DEFAULT_REVIEW_LIMIT,
};
pub use query::{Order, Query};
pub use sample::sample_store;
pub use sequence::{RequestSequence, Ticket};
pub use store::{ContentError, ContentStore, Entries};

use std::sync::Arc;
use tracing::info;

use crate::config::ContentConfig;

/// Catalog over the delivery API, with the sample fallback when enabled
pub fn build_catalog(http: reqwest::Client, config: &ContentConfig) -> anyhow::Result<Catalog> {
    let catalog = Catalog::new(Arc::new(DeliveryClient::new(http, config.clone())));
    if config.is_configured() {
        info!(
            "Content delivery: {} ({})",
            config.delivery_url(),
            config.environment
        );
        return Ok(catalog);
    }
    if config.sample_fallback {
        info!("Content provider not configured, serving the sample catalog");
        return Ok(catalog.with_fallback(Arc::new(sample_store()?)));
    }
    info!("Content provider not configured, listings will be empty");
    Ok(catalog)
}

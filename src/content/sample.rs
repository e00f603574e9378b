//! Bundled sample catalog
//!
//! A handful of cars, variants, reviews and news articles plus the layout
//! singletons, served when the CMS has no credentials and
//! `content.sample_fallback` is enabled.

use anyhow::Result;

use super::memory::MemoryStore;

const SAMPLE_DATA: &str = include_str!("sample_data.json");

pub fn sample_store() -> Result<MemoryStore> {
    MemoryStore::from_json(SAMPLE_DATA)
}

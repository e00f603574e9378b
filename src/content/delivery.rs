//! CMS delivery API client
//!
//! Read-only REST access to published entries:
//! - `GET /v3/content_types/{content_type}/entries`
//! - `GET /v3/content_types/{content_type}/entries/{uid}`
//! - `GET /v3/taxonomies/{taxonomy_uid}/terms`
//!
//! Every request carries the stack's `api_key` and `access_token` headers
//! and the configured `environment`.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::query::Query;
use super::store::{ContentError, ContentStore, Entries};
use crate::config::ContentConfig;
use crate::models::TaxonomyItem;

/// Error code the delivery API uses for a missing entry
const ENTRY_NOT_FOUND_CODE: i64 = 141;

#[derive(Deserialize)]
struct EntriesBody {
    #[serde(default)]
    entries: Vec<Value>,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Deserialize)]
struct EntryBody {
    entry: Value,
}

#[derive(Deserialize)]
struct TermsBody {
    #[serde(default)]
    terms: Vec<TaxonomyItem>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct DeliveryErrorBody {
    error_message: Option<String>,
    error_code: Option<i64>,
}

/// Delivery API client
#[derive(Clone)]
pub struct DeliveryClient {
    http: reqwest::Client,
    config: ContentConfig,
}

impl DeliveryClient {
    pub fn new(http: reqwest::Client, config: ContentConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str, params: &[(String, String)]) -> Result<Url, ContentError> {
        let mut url = Url::parse(&format!("{}{}", self.config.delivery_url(), path))
            .map_err(|e| ContentError::Network(format!("Invalid delivery URL: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("environment", &self.config.environment);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET `url`; `Ok(None)` when the provider reports a missing object
    async fn get(&self, url: Url) -> Result<Option<Vec<u8>>, ContentError> {
        let path = url.path().to_string();
        let response = self
            .http
            .get(url)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .header("api_key", &self.config.api_key)
            .header("access_token", &self.config.delivery_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!("Delivery GET {} -> {}", path, status.as_u16());

        if status.is_success() {
            return Ok(Some(body));
        }

        let error: DeliveryErrorBody = serde_json::from_slice(&body).unwrap_or_default();
        if status == StatusCode::NOT_FOUND || error.error_code == Some(ENTRY_NOT_FOUND_CODE) {
            return Ok(None);
        }
        Err(ContentError::Http {
            status: status.as_u16(),
            message: error
                .error_message
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ContentError> {
    serde_json::from_slice(body).map_err(|e| ContentError::Decode(e.to_string()))
}

#[async_trait]
impl ContentStore for DeliveryClient {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn find(&self, content_type: &str, query: &Query) -> Result<Entries, ContentError> {
        if !self.is_configured() {
            return Err(ContentError::NotConfigured);
        }
        let url = self.url(
            &format!("/v3/content_types/{}/entries", urlencoding::encode(content_type)),
            &query.params(),
        )?;
        match self.get(url).await? {
            Some(body) => {
                let parsed: EntriesBody = decode(&body)?;
                Ok(Entries {
                    entries: parsed.entries,
                    count: parsed.count,
                })
            }
            None => Ok(Entries::default()),
        }
    }

    async fn fetch_entry(&self, content_type: &str, uid: &str) -> Result<Option<Value>, ContentError> {
        if !self.is_configured() {
            return Err(ContentError::NotConfigured);
        }
        let url = self.url(
            &format!(
                "/v3/content_types/{}/entries/{}",
                urlencoding::encode(content_type),
                urlencoding::encode(uid)
            ),
            &[],
        )?;
        match self.get(url).await? {
            Some(body) => Ok(Some(decode::<EntryBody>(&body)?.entry)),
            None => Ok(None),
        }
    }

    async fn taxonomy_terms(&self, taxonomy_uid: &str) -> Result<Vec<TaxonomyItem>, ContentError> {
        if !self.is_configured() {
            return Err(ContentError::NotConfigured);
        }
        let url = self.url(
            &format!("/v3/taxonomies/{}/terms", urlencoding::encode(taxonomy_uid)),
            &[],
        )?;
        match self.get(url).await? {
            Some(body) => Ok(decode::<TermsBody>(&body)?.terms),
            None => Ok(Vec::new()),
        }
    }
}

impl std::fmt::Debug for DeliveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryClient")
            .field("delivery_url", &self.config.delivery_url())
            .field("environment", &self.config.environment)
            .field("configured", &self.config.is_configured())
            .finish()
    }
}

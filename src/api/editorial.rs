//! Review and news API endpoints
//!
//! - GET /reviews - Review listing
//! - GET /reviews/{slug} - Single review (slug or uid)
//! - GET /news - News listing split into featured, regular and breaking
//! - GET /news/{slug} - Single article (slug or uid)

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{page_param, ApiError, AppState, Session};
use crate::content::{Fetched, Page, ReviewSort};
use crate::models::{NewsCategory, NewsEntry, ReviewEntry, REVIEW_TYPES};
use crate::storefront::{NewsFilters, NewsSections, ReviewFilters};

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewsQuery {
    #[serde(rename = "type")]
    pub review_type: Option<String>,
    pub brand: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub q: Option<String>,
}

impl ReviewsQuery {
    fn into_filters(self) -> Result<ReviewFilters, ApiError> {
        Ok(ReviewFilters {
            review_type: non_blank(self.review_type),
            brand: non_blank(self.brand),
            sort: match non_blank(self.sort) {
                Some(sort) => sort
                    .parse::<ReviewSort>()
                    .map_err(|e| ApiError::validation_error(e.to_string()))?,
                None => ReviewSort::Newest,
            },
            page: page_param(self.page)?,
            search: self.q.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

impl NewsQuery {
    fn into_filters(self) -> Result<NewsFilters, ApiError> {
        let category = match non_blank(self.category) {
            // "All" is the default tab
            Some(c) if c.eq_ignore_ascii_case("all") => None,
            Some(c) => Some(
                c.parse::<NewsCategory>()
                    .map_err(|e| ApiError::validation_error(e.to_string()))?,
            ),
            None => None,
        };
        Ok(NewsFilters {
            category,
            search: self.q.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub filters: ReviewFilters,
    pub reviews: Vec<ReviewEntry>,
    pub total: u64,
    pub total_pages: u32,
    pub pagination: Vec<u32>,
    pub has_active_filters: bool,
    pub review_types: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewsListResponse {
    pub filters: NewsFilters,
    #[serde(flatten)]
    pub sections: NewsSections,
    pub categories: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn reviews_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews))
        .route("/{slug}", get(get_review))
}

pub fn news_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news))
        .route("/{slug}", get(get_news))
}

/// Split an applied listing outcome into its page and failure message
fn applied<T>(result: Option<Fetched<Page<T>>>) -> (Page<T>, Option<String>) {
    match result {
        Some(Fetched::Ready(page)) => (page, None),
        Some(Fetched::Failed(message)) => (Page::empty(0, 0), Some(message)),
        _ => (Page::empty(0, 0), None),
    }
}

/// GET /reviews - Review listing
async fn list_reviews(
    State(state): State<AppState>,
    Extension(session): Session,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<ReviewListResponse>, ApiError> {
    let filters = query.into_filters()?;
    let listing = session.review_listing();
    if !listing.load(state.catalog.fetch_reviews(&filters.to_params())).await {
        return Err(ApiError::conflict("Superseded by a newer listing request"));
    }

    let (page, error) = applied(listing.state().result);
    let total = page.total();
    Ok(Json(ReviewListResponse {
        reviews: filters.visible(page.items()).into_iter().cloned().collect(),
        total,
        total_pages: filters.total_pages(total),
        pagination: filters.pagination(total),
        has_active_filters: filters.has_active_filters(),
        review_types: REVIEW_TYPES,
        error,
        filters,
    }))
}

/// GET /reviews/{slug} - Single review
async fn get_review(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ReviewEntry>, ApiError> {
    match state.catalog.resolve_review(&slug).await {
        Fetched::Ready(review) => Ok(Json(review)),
        other => Err(ApiError::from_missing(other, "Review")),
    }
}

/// GET /news - News listing
async fn list_news(
    State(state): State<AppState>,
    Extension(session): Session,
    Query(query): Query<NewsQuery>,
) -> Result<Json<NewsListResponse>, ApiError> {
    let filters = query.into_filters()?;
    let listing = session.news_listing();
    if !listing.load(state.catalog.fetch_news(&filters.to_params())).await {
        return Err(ApiError::conflict("Superseded by a newer listing request"));
    }

    let (page, error) = applied(listing.state().result);
    Ok(Json(NewsListResponse {
        sections: filters.sections(page.items()),
        categories: NewsCategory::ALL.iter().map(NewsCategory::as_str).collect(),
        error,
        filters,
    }))
}

/// GET /news/{slug} - Single article
async fn get_news(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<NewsEntry>, ApiError> {
    match state.catalog.resolve_news(&slug).await {
        Fetched::Ready(news) => Ok(Json(news)),
        other => Err(ApiError::from_missing(other, "News article")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{get_json, sample_app, unconfigured_app};
    use axum::http::StatusCode;

    #[test]
    fn test_news_query_all_category() {
        let filters = NewsQuery {
            category: Some("All".to_string()),
            q: None,
        }
        .into_filters()
        .unwrap();
        assert_eq!(filters.category, None);

        let filters = NewsQuery {
            category: Some("electric".to_string()),
            q: None,
        }
        .into_filters()
        .unwrap();
        assert_eq!(filters.category, Some(NewsCategory::Electric));
    }

    #[tokio::test]
    async fn test_reviews() {
        let app = sample_app();
        let (status, json) = get_json(&app, "/reviews?sort=rating_high").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 4);
        assert_eq!(json["reviews"][0]["uid"], "review-1");

        let (_, json) = get_json(&app, "/reviews/hyundai-creta-2024-first-drive").await;
        assert_eq!(json["uid"], "review-2");
        let (status, _) = get_json(&app, "/reviews/nothing-here").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_review_page_bounds() {
        let app = sample_app();
        let (status, json) = get_json(&app, "/reviews?page=4294967295").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");

        let (status, json) = get_json(&app, "/reviews?page=3").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["reviews"].as_array().unwrap().is_empty());
        assert_eq!(json["total"], 4);
        assert_eq!(json["total_pages"], 1);
    }

    #[tokio::test]
    async fn test_news_sections() {
        let app = sample_app();
        let (status, json) = get_json(&app, "/news").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["featured"].as_array().unwrap().len(), 2);
        assert_eq!(json["regular"].as_array().unwrap().len(), 2);
        assert_eq!(json["breaking"]["uid"], "news-2");
        assert_eq!(json["categories"].as_array().unwrap().len(), 7);

        let (_, json) = get_json(&app, "/news?category=Policy").await;
        assert_eq!(json["regular"][0]["uid"], "news-4");

        let (status, _) = get_json(&app, "/news?category=gossip").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, json) = get_json(&app, "/news/mahindra-be-6e-launched-price-specs").await;
        assert_eq!(json["uid"], "news-3");
    }

    #[tokio::test]
    async fn test_unconfigured_detail_is_unavailable() {
        let app = unconfigured_app();
        let (status, json) = get_json(&app, "/reviews/anything").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "NOT_CONFIGURED");

        let (status, json) = get_json(&app, "/reviews").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["reviews"].as_array().unwrap().is_empty());
    }
}

//! Home page, layout and health endpoints
//!
//! - GET / - Banner, featured cars, reviews and news, breaking news
//! - GET /layout - Header and footer
//! - GET /health - Liveness

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::AppState;
use crate::models::{BannerEntry, CarEntry, FooterEntry, HeaderEntry, NewsEntry, ReviewEntry};

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub banner: Option<BannerEntry>,
    pub featured_cars: Vec<CarEntry>,
    pub featured_reviews: Vec<ReviewEntry>,
    pub featured_news: Vec<NewsEntry>,
    pub breaking_news: Vec<NewsEntry>,
    /// False when no catalog source is available at all
    pub content_available: bool,
}

#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    pub header: Option<HeaderEntry>,
    pub footer: Option<FooterEntry>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub content_configured: bool,
    pub identity_configured: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/layout", get(layout))
        .route("/health", get(health))
}

/// GET / - Home page
///
/// Every section loads independently; a failed section is left empty.
async fn home(State(state): State<AppState>) -> Json<HomeResponse> {
    let catalog = &state.catalog;
    let (banner, cars, reviews, news, breaking) = tokio::join!(
        catalog.banner(),
        catalog.featured_cars(),
        catalog.featured_reviews(),
        catalog.featured_news(),
        catalog.breaking_news(),
    );

    let content_available = !banner.is_not_configured() || !cars.is_not_configured();
    Json(HomeResponse {
        banner: banner.ready(),
        featured_cars: cars.into_vec(),
        featured_reviews: reviews.into_vec(),
        featured_news: news.into_vec(),
        breaking_news: breaking.into_vec(),
        content_available,
    })
}

/// GET /layout - Header and footer singletons
async fn layout(State(state): State<AppState>) -> Json<LayoutResponse> {
    let (header, footer) = tokio::join!(state.catalog.header(), state.catalog.footer());
    Json(LayoutResponse {
        header: header.ready(),
        footer: footer.ready(),
    })
}

/// GET /health - Liveness
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        content_configured: state.config.content.is_configured(),
        identity_configured: state.config.identity.is_configured(),
    })
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{get_json, sample_app, unconfigured_app};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_home_with_sample_catalog() {
        let app = sample_app();
        let (status, json) = get_json(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["content_available"], true);
        assert_eq!(json["featured_cars"].as_array().unwrap().len(), 2);
        assert_eq!(json["featured_reviews"].as_array().unwrap().len(), 3);
        assert_eq!(json["breaking_news"][0]["uid"], "news-2");
        assert!(json["banner"].is_object());
    }

    #[tokio::test]
    async fn test_home_without_content() {
        let app = unconfigured_app();
        let (status, json) = get_json(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["content_available"], false);
        assert!(json["featured_cars"].as_array().unwrap().is_empty());
        assert!(json["banner"].is_null());
    }

    #[tokio::test]
    async fn test_layout_and_health() {
        let app = sample_app();
        let (_, json) = get_json(&app, "/layout").await;
        assert_eq!(json["header"]["logo_text"], "AutoStack");
        assert_eq!(json["footer"]["brand_name"], "AutoStack");

        let (status, json) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["content_configured"], false);
    }
}

//! API layer - HTTP handlers and routing
//!
//! This module contains the storefront's HTTP endpoints. Each route mirrors
//! a storefront page and answers with its JSON view model:
//! - Home, layout and health endpoints
//! - Car listing, detail, interest and test-drive endpoints
//! - Review and news endpoints
//! - Email-link authentication endpoints
//! - Dashboard endpoints

pub mod auth;
pub mod cars;
pub mod dashboard;
pub mod editorial;
pub mod home;
pub mod middleware;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use middleware::{ApiError, AppState};
pub use session::{toolkit_factory, IdentityFactory, SessionContext, SessionRegistry, VisitorBackend};

/// Build the storefront routes
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .merge(home::router())
        .nest("/cars", cars::router())
        .nest("/reviews", editorial::reviews_router())
        .nest("/news", editorial::news_router())
        .nest("/auth", auth::router())
        .nest("/dashboard", dashboard::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => warn!("Ignoring invalid CORS origin '{}': {}", cors_origin, e),
    }

    build_api_router()
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::attach_session,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

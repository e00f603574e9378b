//! Dashboard API endpoints
//!
//! - GET /dashboard - Profile, interests and test drives of the signed-in user
//! - PUT /dashboard/profile - Update name and city

use axum::{
    response::{IntoResponse, Redirect, Response},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{AppState, Session};
use crate::storefront::{Dashboard, DashboardView};

const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/profile", put(update_profile))
}

/// GET /dashboard
async fn dashboard(Extension(session): Session) -> Response {
    let backend = session.backend(DASHBOARD_PATH);
    let response = match Dashboard::new(session.bridge(), backend.client()).load().await {
        DashboardView::Ready(data) => Json(data).into_response(),
        DashboardView::Redirect(to) => Redirect::to(&to).into_response(),
    };
    backend.respond(response)
}

/// PUT /dashboard/profile
async fn update_profile(Extension(session): Session, Json(req): Json<ProfileRequest>) -> Response {
    let backend = session.backend(DASHBOARD_PATH);
    let response = Dashboard::new(session.bridge(), backend.client())
        .update_profile(&req.name, &req.city)
        .await
        .into_response();
    backend.respond(response)
}

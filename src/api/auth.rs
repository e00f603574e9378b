//! Authentication API endpoints
//!
//! Handles passwordless email-link sign-in:
//! - GET /auth/login - Login form state (redirects when already signed in)
//! - POST /auth/login - Email a sign-in link
//! - GET /auth/callback - Complete sign-in from the clicked link
//! - POST /auth/logout - Sign out

use axum::{
    extract::{Query, State},
    http::Uri,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, Session};
use crate::storefront::{CallbackFlow, CallbackView, Dashboard, LoginFlow, LoginView};

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

/// Request body for sending a login link
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    pub redirect: Option<String>,
}

/// Query of the callback route
///
/// The identity provider appends its own parameters (`mode`, `oobCode`,
/// ...) to the continue URL; they stay in the link passed on to the provider.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub redirect: Option<String>,
    /// Needed when the link is opened in another browser
    pub email: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(send_link))
        .route("/callback", get(callback))
        .route("/logout", post(logout))
}

fn view_response(view: &LoginView) -> Response {
    match view {
        LoginView::Redirect { to } => Redirect::to(to).into_response(),
        LoginView::Form {
            error: Some(message),
            ..
        } => ApiError::validation_error(message.clone()).into_response(),
        view => Json(view).into_response(),
    }
}

/// GET /auth/login - Login page
async fn login_form(Extension(session): Session, Query(query): Query<LoginQuery>) -> Response {
    let flow = LoginFlow::open(session.bridge(), query.redirect.as_deref());
    view_response(flow.view())
}

/// POST /auth/login - Send a sign-in link
async fn send_link(Extension(session): Session, Json(req): Json<LoginRequest>) -> Response {
    let mut flow = LoginFlow::open(session.bridge(), req.redirect.as_deref());
    if matches!(flow.view(), LoginView::Redirect { .. }) {
        return view_response(flow.view());
    }
    let view = flow.submit(session.bridge(), &req.email).await;
    view_response(view)
}

/// GET /auth/callback - Complete an email-link sign-in
async fn callback(
    State(state): State<AppState>,
    Extension(session): Session,
    uri: Uri,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/auth/callback");
    let link = format!(
        "{}{}",
        state.config.server.site_url.trim_end_matches('/'),
        path_and_query
    );

    let redirect = query.redirect.as_deref().unwrap_or(crate::storefront::DEFAULT_AFTER_LOGIN);
    let backend = session.backend(redirect);
    let view = CallbackFlow::new(session.bridge(), backend.client())
        .complete(&link, query.email.as_deref(), query.redirect.as_deref())
        .await;

    match view {
        CallbackView::Success { redirect, .. } => Redirect::to(&redirect).into_response(),
        CallbackView::EmailRequired => Json(view).into_response(),
        CallbackView::Error { message } => ApiError::validation_error(message).into_response(),
    }
}

/// POST /auth/logout - Sign out
async fn logout(State(state): State<AppState>, Extension(session): Session) -> Redirect {
    let backend = session.backend("/");
    let next = Dashboard::new(session.bridge(), backend.client()).logout().await;
    state.sessions.end(session.id()).await;
    Redirect::to(&next)
}

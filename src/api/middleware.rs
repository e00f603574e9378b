//! API middleware
//!
//! Contains:
//! - Application state shared by every handler
//! - The JSON error shape
//! - Session resolution (cookie to per-visitor `SessionContext`)

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::session::{SessionContext, SessionRegistry};
use crate::config::Config;
use crate::content::{Catalog, Fetched};
use crate::storefront::{ActionResult, MAX_PAGE};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Catalog,
    pub sessions: Arc<SessionRegistry>,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    /// The CMS or the backend failed
    pub fn upstream_error(message: impl Into<String>) -> Self {
        Self::new("UPSTREAM_ERROR", message)
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new("NOT_CONFIGURED", message)
    }

    /// Map a single-entry fetch that did not produce the entry
    pub fn from_missing<T>(fetched: Fetched<T>, what: &str) -> Self {
        match fetched {
            Fetched::Ready(_) | Fetched::Empty => Self::not_found(format!("{} not found", what)),
            Fetched::Failed(message) => Self::upstream_error(message),
            Fetched::NotConfigured => Self::not_configured("Content provider is not configured"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "UPSTREAM_ERROR" => StatusCode::BAD_GATEWAY,
            "NOT_CONFIGURED" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ActionResult<T> {
    fn into_response(self) -> Response {
        match self {
            ActionResult::Done(value) => Json(value).into_response(),
            ActionResult::Redirect(to) => Redirect::to(&to).into_response(),
            ActionResult::Invalid(message) => ApiError::validation_error(message).into_response(),
            ActionResult::Failed(message) => ApiError::upstream_error(message).into_response(),
        }
    }
}

/// 1-based page number of a listing query; absent means the first page
pub fn page_param(page: Option<u32>) -> Result<u32, ApiError> {
    match page.unwrap_or(1) {
        p if p > MAX_PAGE => Err(ApiError::validation_error(format!(
            "Page must be at most {}",
            MAX_PAGE
        ))),
        p => Ok(p.max(1)),
    }
}

/// Extract the session id from the `Cookie` header
pub fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let prefix = format!("{}=", cookie_name);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()).map(str::to_string))
        .filter(|id| !id.is_empty())
}

/// Session middleware
///
/// Resolves the visitor's `SessionContext` from the session cookie, starting
/// a new one when the cookie is missing or the session idled out, and makes
/// it available to handlers as an extension.
pub async fn attach_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let registry = &state.sessions;
    let cookie = session_cookie(request.headers(), registry.cookie_name());
    let (session, created) = registry.resolve(cookie.as_deref()).await;
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if created {
        debug!("Started visitor session");
        match HeaderValue::from_str(&registry.set_cookie(session.id())) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Invalid session cookie: {}", e),
        }
    }
    response
}

/// Visitor session injected by [`attach_session`]
pub type Session = axum::Extension<Arc<SessionContext>>;

//! Presentation-state controllers
//!
//! One controller per storefront page. Controllers hold what the page shows
//! and decide what happens on each visitor action; the HTTP layer only
//! parses input and renders the outcome.

mod auth;
mod car_detail;
mod cars;
mod dashboard;
mod editorial;
mod listing;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{
    CallbackFlow, CallbackView, LoginFlow, LoginView, EMAIL_REQUIRED_MESSAGE,
    INVALID_EMAIL_MESSAGE, INVALID_LINK_MESSAGE,
};
pub use car_detail::{
    load_car_detail, CarActions, CarDetail, INVALID_DATE_MESSAGE, TEST_DRIVE_WINDOW_DAYS,
    WINDOW_MESSAGE,
};
pub use cars::{CarFilters, PriceRange, CARS_PER_PAGE, PRICE_RANGES};
pub use dashboard::{Dashboard, DashboardData, DashboardView, NAME_REQUIRED_MESSAGE};
pub use editorial::{NewsFilters, NewsSections, ReviewFilters, NEWS_PAGE_SIZE, REVIEWS_PER_PAGE};
pub use listing::{page_offset, pagination_window, total_pages, Listing, ListingState, MAX_PAGE};

use serde::Serialize;
use tracing::warn;

use crate::backend::{login_location, ApiError};

/// Where the visitor lands after signing in when no target is given
pub const DEFAULT_AFTER_LOGIN: &str = "/dashboard";

/// Same-site path to continue to, `fallback` for anything else
///
/// Absolute and protocol-relative URLs are refused so a crafted link cannot
/// send the visitor off-site.
pub fn safe_redirect(target: Option<&str>, fallback: &str) -> String {
    match target.map(str::trim) {
        Some(t) if t.starts_with('/') && !t.starts_with("//") && !t.contains('\\') => t.to_string(),
        _ => fallback.to_string(),
    }
}

/// Outcome of a visitor action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "data", rename_all = "snake_case")]
pub enum ActionResult<T> {
    Done(T),
    /// Navigate away, e.g. to the login page
    Redirect(String),
    /// Input rejected before any request was made
    Invalid(String),
    /// The request failed; the message is shown inline
    Failed(String),
}

impl<T> ActionResult<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, ActionResult::Done(_))
    }

    pub fn redirect(&self) -> Option<&str> {
        match self {
            ActionResult::Redirect(to) => Some(to),
            _ => None,
        }
    }

    /// Map a backend result; auth failures send the visitor to log in and
    /// come back to `return_to`
    pub fn from_api(result: Result<T, ApiError>, return_to: &str, what: &str) -> Self {
        match result {
            Ok(value) => ActionResult::Done(value),
            Err(e) if e.is_auth_error() => ActionResult::Redirect(login_location(Some(return_to))),
            Err(e) => {
                warn!("{} failed: {}", what, e);
                ActionResult::Failed(e.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(Some("/cars/nexon"), "/dashboard"), "/cars/nexon");
        assert_eq!(safe_redirect(None, "/dashboard"), "/dashboard");
        assert_eq!(safe_redirect(Some(""), "/dashboard"), "/dashboard");
        assert_eq!(safe_redirect(Some("https://evil.test"), "/"), "/");
        assert_eq!(safe_redirect(Some("//evil.test"), "/"), "/");
        assert_eq!(safe_redirect(Some("/\\evil.test"), "/"), "/");
    }

    #[test]
    fn test_action_result_from_api() {
        let ok: ActionResult<u8> = ActionResult::from_api(Ok(1), "/cars/x", "test");
        assert_eq!(ok, ActionResult::Done(1));

        let expired: ActionResult<u8> =
            ActionResult::from_api(Err(ApiError::session_expired()), "/cars/x", "test");
        assert_eq!(expired.redirect(), Some("/auth/login?redirect=%2Fcars%2Fx"));

        let failed: ActionResult<u8> = ActionResult::from_api(
            Err(ApiError::new("Car not available", "CONFLICT", 409)),
            "/cars/x",
            "test",
        );
        assert_eq!(failed, ActionResult::Failed("Car not available".to_string()));
    }

    #[test]
    fn test_action_result_serialization() {
        let value = serde_json::to_value(ActionResult::<()>::Invalid("bad".to_string())).unwrap();
        assert_eq!(value, serde_json::json!({"result": "invalid", "data": "bad"}));
    }
}

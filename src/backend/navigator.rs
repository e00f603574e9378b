//! Navigation side effects requested by the API client

use std::sync::{Mutex, PoisonError};

/// Route of the login page
pub const LOGIN_ROUTE: &str = "/auth/login";

/// Receives full-page navigations
pub trait Navigator: Send + Sync {
    fn assign(&self, location: &str);
}

/// Navigator that remembers the last requested location
///
/// The storefront server creates one per request and turns a recorded
/// location into a redirect.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    location: Mutex<Option<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self) -> Option<String> {
        self.location.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn take(&self) -> Option<String> {
        self.location.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl Navigator for RecordingNavigator {
    fn assign(&self, location: &str) {
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = Some(location.to_string());
    }
}

/// Login location that brings the visitor back to `return_to` afterwards
pub fn login_location(return_to: Option<&str>) -> String {
    match return_to.filter(|r| !r.is_empty()) {
        Some(path) => format!("{}?redirect={}", LOGIN_ROUTE, urlencoding::encode(path)),
        None => LOGIN_ROUTE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator() {
        let nav = RecordingNavigator::new();
        assert_eq!(nav.location(), None);
        nav.assign("/auth/login");
        nav.assign("/dashboard");
        assert_eq!(nav.location().as_deref(), Some("/dashboard"));
        assert_eq!(nav.take().as_deref(), Some("/dashboard"));
        assert_eq!(nav.location(), None);
    }

    #[test]
    fn test_login_location() {
        assert_eq!(login_location(None), "/auth/login");
        assert_eq!(login_location(Some("")), "/auth/login");
        assert_eq!(login_location(Some("/cars/abc")), "/auth/login?redirect=%2Fcars%2Fabc");
    }
}

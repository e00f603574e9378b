//! Identity provider abstraction
//!
//! A provider owns one visitor's credentials: it sends email sign-in links,
//! exchanges a clicked link for a signed-in user, hands out (and refreshes)
//! ID tokens and reports every change of the signed-in user to its
//! auth-state listeners.

use async_trait::async_trait;
use reqwest::Url;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use crate::models::SessionUser;

/// Identity errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Identity provider is not configured")]
    NotConfigured,

    #[error("Email is required to complete sign-in")]
    EmailRequired,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid or expired login link")]
    InvalidLink,

    /// The provider no longer accepts the user's refresh token
    #[error("Session expired")]
    SessionExpired,

    #[error("Too many attempts, please try again later")]
    TooManyAttempts,

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Identity provider unreachable: {0}")]
    Network(String),
}

impl IdentityError {
    /// Map a provider error code (e.g. `EXPIRED_OOB_CODE : detail`) to a variant
    pub fn from_provider_code(message: &str) -> Self {
        let code = message.split([' ', ':']).next().unwrap_or_default();
        match code {
            "INVALID_OOB_CODE" | "EXPIRED_OOB_CODE" => IdentityError::InvalidLink,
            "INVALID_EMAIL" | "MISSING_EMAIL" => IdentityError::InvalidEmail,
            "TOKEN_EXPIRED" | "USER_DISABLED" | "USER_NOT_FOUND" | "INVALID_REFRESH_TOKEN"
            | "INVALID_ID_TOKEN" => IdentityError::SessionExpired,
            "TOO_MANY_ATTEMPTS_TRY_LATER" | "QUOTA_EXCEEDED" => IdentityError::TooManyAttempts,
            _ => IdentityError::Provider(message.to_string()),
        }
    }

    /// Whether the error means the provider dropped the signed-in user
    pub fn is_session_expired(&self) -> bool {
        matches!(self, IdentityError::SessionExpired)
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        IdentityError::Network(e.to_string())
    }
}

/// Auth-state listener, called with the new user (`None` when signed out)
pub type AuthListener = Arc<dyn Fn(Option<&SessionUser>) + Send + Sync>;

/// Handle returned when a listener is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of auth-state listeners
///
/// Listeners are cloned out of the lock before they are called, so a
/// listener may register or remove listeners itself.
#[derive(Default)]
pub struct ListenerSet {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, AuthListener)>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: AuthListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn clear(&self) {
        self.listeners.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify(&self, user: Option<&SessionUser>) {
        let snapshot: Vec<AuthListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        for listener in snapshot {
            listener(user);
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet").field("len", &self.len()).finish()
    }
}

/// Email-link identity provider for a single visitor
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether credentials for the provider are present
    fn is_configured(&self) -> bool;

    /// Email a sign-in link that returns the visitor to `continue_url`
    async fn send_sign_in_link(&self, email: &str, continue_url: &str) -> Result<(), IdentityError>;

    fn is_sign_in_link(&self, link: &str) -> bool {
        is_email_sign_in_link(link)
    }

    /// Exchange a clicked link for a signed-in user
    ///
    /// On success the provider notifies its listeners with the new user.
    async fn sign_in_with_link(&self, email: &str, link: &str) -> Result<SessionUser, IdentityError>;

    fn current_user(&self) -> Option<SessionUser>;

    /// Current ID token, refreshed when expired or when `force_refresh` is set
    ///
    /// `Ok(None)` when nobody is signed in. A refresh the provider rejects
    /// for good signs the user out and notifies the listeners.
    async fn id_token(&self, force_refresh: bool) -> Result<Option<String>, IdentityError>;

    /// Drop the signed-in user and notify the listeners
    async fn sign_out(&self) -> Result<(), IdentityError>;

    fn add_listener(&self, listener: AuthListener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// Extract the one-time code from an email sign-in link
///
/// The code is read from the link itself or from a link nested in its
/// `link`, `continueUrl` or `deep_link_id` parameter.
pub fn sign_in_code(link: &str) -> Option<String> {
    fn find(url: &Url, depth: u8) -> Option<String> {
        let mut mode_sign_in = false;
        let mut code = None;
        let mut nested = Vec::new();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "mode" => mode_sign_in = value == "signIn",
                "oobCode" if !value.is_empty() => code = Some(value.into_owned()),
                "link" | "continueUrl" | "deep_link_id" => nested.push(value.into_owned()),
                _ => {}
            }
        }

        if mode_sign_in {
            if let Some(code) = code {
                return Some(code);
            }
        }
        if depth == 0 {
            return None;
        }
        nested
            .iter()
            .filter_map(|n| Url::parse(n).ok())
            .find_map(|n| find(&n, depth - 1))
    }

    let url = Url::parse(link.trim()).ok()?;
    find(&url, 2)
}

pub fn is_email_sign_in_link(link: &str) -> bool {
    sign_in_code(link).is_some()
}

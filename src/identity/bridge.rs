//! Session/auth bridge
//!
//! Wraps one visitor's identity provider and exposes the signed-in user as
//! observable state:
//!
//! ```text
//! SignedOut --send_login_link--> LinkPending{email}
//! LinkPending --complete_login--> SignedIn{user}
//! SignedIn --logout | provider expiry--> SignedOut
//! ```
//!
//! Exactly one listener is registered with the provider per bridge; it
//! fans out to the bridge's own subscribers.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use tracing::{debug, info, warn};

use super::provider::{AuthListener, IdentityError, IdentityProvider, ListenerId, ListenerSet};
use crate::backend::TokenSource;
use crate::models::SessionUser;

/// Where the visitor stands in the sign-in flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    SignedOut,
    LinkPending { email: String },
    SignedIn { user: SessionUser },
}

impl SessionState {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionState::SignedIn { user } => Some(user),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Shared {
    state: RwLock<SessionState>,
    /// Email the last link was sent to, needed to complete the sign-in
    pending_email: RwLock<Option<String>>,
    subscribers: ListenerSet,
}

impl Shared {
    fn state(&self) -> SessionState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn pending_email(&self) -> Option<String> {
        self.pending_email.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_pending_email(&self, email: Option<String>) {
        *self.pending_email.write().unwrap_or_else(PoisonError::into_inner) = email;
    }

    /// Provider-side user change
    fn on_user_changed(&self, user: Option<&SessionUser>) {
        match user {
            Some(user) => self.set_state(SessionState::SignedIn { user: user.clone() }),
            None => {
                // A pending link survives a sign-out notification
                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                if matches!(*state, SessionState::SignedIn { .. }) {
                    *state = SessionState::SignedOut;
                }
            }
        }
        self.subscribers.notify(user);
    }
}

/// Active subscription to a bridge; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: ListenerId,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.subscribers.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Session/auth bridge for one visitor
pub struct SessionBridge {
    provider: Arc<dyn IdentityProvider>,
    shared: Arc<Shared>,
    provider_listener: Mutex<Option<ListenerId>>,
    callback_url: String,
}

impl SessionBridge {
    /// Create a bridge over `provider`; sign-in links return to
    /// `{site_url}/auth/callback`
    pub fn new(provider: Arc<dyn IdentityProvider>, site_url: &str) -> Self {
        let shared = Arc::new(Shared::default());
        if let Some(user) = provider.current_user() {
            shared.set_state(SessionState::SignedIn { user });
        }

        let provider_listener = if provider.is_configured() {
            let weak = Arc::downgrade(&shared);
            let listener: AuthListener = Arc::new(move |user: Option<&SessionUser>| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_user_changed(user);
                }
            });
            Some(provider.add_listener(listener))
        } else {
            debug!("Identity provider not configured; session stays signed out");
            None
        };

        Self {
            provider,
            shared,
            provider_listener: Mutex::new(provider_listener),
            callback_url: format!("{}/auth/callback", site_url.trim_end_matches('/')),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Email a sign-in link; after the click the visitor lands on the
    /// callback route carrying `redirect`
    pub async fn send_login_link(&self, email: &str, redirect: Option<&str>) -> Result<(), IdentityError> {
        if !self.provider.is_configured() {
            return Err(IdentityError::NotConfigured);
        }

        let continue_url = match redirect.filter(|r| !r.is_empty()) {
            Some(r) => format!("{}?redirect={}", self.callback_url, urlencoding::encode(r)),
            None => self.callback_url.clone(),
        };
        self.provider.send_sign_in_link(email, &continue_url).await?;

        self.shared.set_pending_email(Some(email.to_string()));
        {
            let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
            if !matches!(*state, SessionState::SignedIn { .. }) {
                *state = SessionState::LinkPending {
                    email: email.to_string(),
                };
            }
        }
        info!("Login link requested");
        Ok(())
    }

    pub fn is_sign_in_link(&self, link: &str) -> bool {
        self.provider.is_configured() && self.provider.is_sign_in_link(link)
    }

    /// Email the last link was sent to, if any
    pub fn pending_email(&self) -> Option<String> {
        self.shared.pending_email()
    }

    /// Complete sign-in from a clicked link
    ///
    /// `Ok(None)` when `link` is not an email sign-in link. The email is
    /// `email` when given, otherwise the one the link was sent to.
    pub async fn complete_login(
        &self,
        link: &str,
        email: Option<&str>,
    ) -> Result<Option<SessionUser>, IdentityError> {
        if !self.provider.is_configured() {
            return Err(IdentityError::NotConfigured);
        }
        if !self.provider.is_sign_in_link(link) {
            return Ok(None);
        }

        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .or_else(|| self.shared.pending_email())
            .ok_or(IdentityError::EmailRequired)?;

        let user = self.provider.sign_in_with_link(&email, link).await?;
        self.shared.set_pending_email(None);

        // Providers report the sign-in through the listener; keep the state
        // right even for one that does not.
        if self.shared.state().user() != Some(&user) {
            self.shared.on_user_changed(Some(&user));
        }
        Ok(Some(user))
    }

    /// Current ID token, `None` when signed out or when the refresh fails
    pub async fn token(&self, force_refresh: bool) -> Option<String> {
        if !self.provider.is_configured() {
            return None;
        }
        match self.provider.id_token(force_refresh).await {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to get ID token: {}", e);
                None
            }
        }
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.shared.state().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.shared.state().user().is_some()
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Observe the signed-in user
    ///
    /// `callback` runs right away with the current user and again on every
    /// change until the returned guard is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&SessionUser>) + Send + Sync + 'static,
    {
        let callback: AuthListener = Arc::new(callback);
        let id = self.shared.subscribers.add(callback.clone());
        let current = self.current_user();
        callback(current.as_ref());

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    pub async fn logout(&self) -> Result<(), IdentityError> {
        self.shared.set_pending_email(None);
        if self.provider.is_configured() {
            self.provider.sign_out().await?;
        }

        let was_signed_in = {
            let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
            let was = matches!(*state, SessionState::SignedIn { .. });
            *state = SessionState::SignedOut;
            was
        };
        // The provider listener normally reported this already
        if was_signed_in {
            self.shared.subscribers.notify(None);
        }
        info!("User logged out");
        Ok(())
    }

    /// Detach from the provider and drop every subscriber
    pub fn close(&self) {
        let id = self
            .provider_listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = id {
            self.provider.remove_listener(id);
        }
        self.shared.subscribers.clear();
    }
}

impl Drop for SessionBridge {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SessionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBridge")
            .field("state", &self.shared.state())
            .field("subscribers", &self.shared.subscribers.len())
            .finish()
    }
}

#[async_trait]
impl TokenSource for SessionBridge {
    async fn bearer_token(&self) -> Option<String> {
        self.token(false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::testing::FakeIdentity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LINK: &str = "http://localhost:3000/auth/callback?mode=signIn&oobCode=abc";

    fn bridge(provider: &Arc<FakeIdentity>) -> SessionBridge {
        SessionBridge::new(provider.clone(), "http://localhost:3000/")
    }

    #[tokio::test]
    async fn test_full_sign_in_flow() {
        let provider = Arc::new(FakeIdentity::configured());
        let bridge = bridge(&provider);
        assert_eq!(bridge.state(), SessionState::SignedOut);
        assert_eq!(bridge.token(false).await, None);

        bridge.send_login_link("user@example.com", Some("/cars/abc")).await.unwrap();
        assert_eq!(
            bridge.state(),
            SessionState::LinkPending {
                email: "user@example.com".to_string()
            }
        );
        assert_eq!(bridge.token(false).await, None);
        assert_eq!(
            provider.sent_links(),
            vec![(
                "user@example.com".to_string(),
                "http://localhost:3000/auth/callback?redirect=%2Fcars%2Fabc".to_string()
            )]
        );

        let user = bridge.complete_login(LINK, None).await.unwrap().unwrap();
        assert_eq!(user.email.as_deref(), Some("user@example.com"));
        assert!(bridge.is_authenticated());
        assert_eq!(bridge.pending_email(), None);
        assert!(bridge.token(false).await.is_some());

        bridge.logout().await.unwrap();
        assert_eq!(bridge.state(), SessionState::SignedOut);
        assert_eq!(bridge.token(false).await, None);
    }

    #[tokio::test]
    async fn test_complete_login_requires_email() {
        let provider = Arc::new(FakeIdentity::configured());
        let bridge = bridge(&provider);

        assert_eq!(bridge.complete_login(LINK, None).await, Err(IdentityError::EmailRequired));
        assert_eq!(bridge.complete_login(LINK, Some("  ")).await, Err(IdentityError::EmailRequired));

        let user = bridge.complete_login(LINK, Some("other@example.com")).await.unwrap().unwrap();
        assert_eq!(user.email.as_deref(), Some("other@example.com"));
    }

    #[tokio::test]
    async fn test_non_link_is_not_an_error() {
        let provider = Arc::new(FakeIdentity::configured());
        let bridge = bridge(&provider);
        assert_eq!(
            bridge.complete_login("http://localhost:3000/auth/callback", Some("a@b.co")).await,
            Ok(None)
        );
        assert_eq!(provider.sign_in_calls(), 0);
    }

    #[tokio::test]
    async fn test_not_configured() {
        let provider = Arc::new(FakeIdentity::unconfigured());
        let bridge = bridge(&provider);

        assert_eq!(
            bridge.send_login_link("user@example.com", None).await,
            Err(IdentityError::NotConfigured)
        );
        assert_eq!(bridge.complete_login(LINK, None).await, Err(IdentityError::NotConfigured));
        assert_eq!(bridge.token(true).await, None);
        assert_eq!(provider.listener_count(), 0);

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let _sub = bridge.subscribe(move |user| {
            assert!(user.is_none());
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_provider_listener_fans_out() {
        let provider = Arc::new(FakeIdentity::configured());
        let bridge = bridge(&provider);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<Subscription> = (0..3)
            .map(|i| {
                let sink = seen.clone();
                bridge.subscribe(move |user| {
                    sink.lock().unwrap().push((i, user.is_some()));
                })
            })
            .collect();
        assert_eq!(provider.listener_count(), 1);
        assert_eq!(bridge.subscriber_count(), 3);

        bridge.complete_login(LINK, Some("user@example.com")).await.unwrap();

        let events = seen.lock().unwrap().clone();
        // three immediate calls with no user, then one signed-in call each
        assert_eq!(events.len(), 6);
        assert_eq!(events.iter().filter(|(_, signed_in)| *signed_in).count(), 3);
        drop(subs);
        assert_eq!(bridge.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_notifications() {
        let provider = Arc::new(FakeIdentity::configured());
        let bridge = bridge(&provider);

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let sub = bridge.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();

        bridge.complete_login(LINK, Some("user@example.com")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_expiry_signs_out() {
        let provider = Arc::new(FakeIdentity::configured());
        let bridge = bridge(&provider);
        bridge.complete_login(LINK, Some("user@example.com")).await.unwrap();

        let last = Arc::new(Mutex::new(Some(true)));
        let sink = last.clone();
        let _sub = bridge.subscribe(move |user| {
            *sink.lock().unwrap() = Some(user.is_some());
        });

        provider.expire_session();
        assert_eq!(bridge.token(false).await, None);
        assert_eq!(bridge.state(), SessionState::SignedOut);
        assert_eq!(*last.lock().unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_close_detaches_from_provider() {
        let provider = Arc::new(FakeIdentity::configured());
        {
            let bridge = bridge(&provider);
            let _sub = bridge.subscribe(|_| {});
            assert_eq!(provider.listener_count(), 1);
            bridge.close();
            assert_eq!(provider.listener_count(), 0);
            assert_eq!(bridge.subscriber_count(), 0);
        }

        let bridge = bridge(&provider);
        assert_eq!(provider.listener_count(), 1);
        drop(bridge);
        assert_eq!(provider.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_bridge_picks_up_existing_user() {
        let provider = Arc::new(FakeIdentity::configured());
        provider.sign_in_with_link("user@example.com", LINK).await.unwrap();

        let bridge = bridge(&provider);
        assert!(bridge.is_authenticated());
        assert_eq!(bridge.bearer_token().await, bridge.token(false).await);
    }
}

//! In-memory identity provider for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use super::provider::{
    is_email_sign_in_link, AuthListener, IdentityError, IdentityProvider, ListenerId, ListenerSet,
};
use crate::models::SessionUser;

/// Provider that accepts every well-formed sign-in link
pub(crate) struct FakeIdentity {
    configured: bool,
    user: RwLock<Option<SessionUser>>,
    token_version: AtomicUsize,
    expired: AtomicBool,
    send_error: Mutex<Option<IdentityError>>,
    sent: Mutex<Vec<(String, String)>>,
    sign_in_calls: AtomicUsize,
    listeners: ListenerSet,
}

impl FakeIdentity {
    fn with_configured(configured: bool) -> Self {
        Self {
            configured,
            user: RwLock::new(None),
            token_version: AtomicUsize::new(0),
            expired: AtomicBool::new(false),
            send_error: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            sign_in_calls: AtomicUsize::new(0),
            listeners: ListenerSet::new(),
        }
    }

    pub fn configured() -> Self {
        Self::with_configured(true)
    }

    pub fn unconfigured() -> Self {
        Self::with_configured(false)
    }

    /// `(email, continue_url)` of every link sent
    pub fn sent_links(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Make the next token request fail as a provider-side expiry
    pub fn expire_session(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    pub fn fail_sends_with(&self, error: IdentityError) {
        *self.send_error.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send_sign_in_link(&self, email: &str, continue_url: &str) -> Result<(), IdentityError> {
        if !self.configured {
            return Err(IdentityError::NotConfigured);
        }
        if let Some(e) = self.send_error.lock().unwrap().clone() {
            return Err(e);
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), continue_url.to_string()));
        Ok(())
    }

    async fn sign_in_with_link(&self, email: &str, link: &str) -> Result<SessionUser, IdentityError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if !is_email_sign_in_link(link) {
            return Err(IdentityError::InvalidLink);
        }
        let user = SessionUser {
            uid: format!("uid-{}", email),
            email: Some(email.to_string()),
            display_name: None,
            photo_url: None,
            email_verified: true,
        };
        *self.user.write().unwrap() = Some(user.clone());
        self.expired.store(false, Ordering::SeqCst);
        self.listeners.notify(Some(&user));
        Ok(user)
    }

    fn current_user(&self) -> Option<SessionUser> {
        self.user.read().unwrap().clone()
    }

    async fn id_token(&self, force_refresh: bool) -> Result<Option<String>, IdentityError> {
        let Some(user) = self.current_user() else {
            return Ok(None);
        };
        if self.expired.load(Ordering::SeqCst) {
            *self.user.write().unwrap() = None;
            self.listeners.notify(None);
            return Err(IdentityError::SessionExpired);
        }
        if force_refresh {
            self.token_version.fetch_add(1, Ordering::SeqCst);
        }
        Ok(Some(format!(
            "token-{}-{}",
            user.uid,
            self.token_version.load(Ordering::SeqCst)
        )))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let previous = self.user.write().unwrap().take();
        if previous.is_some() {
            self.listeners.notify(None);
        }
        Ok(())
    }

    fn add_listener(&self, listener: AuthListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}

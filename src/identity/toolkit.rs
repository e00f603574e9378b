//! REST identity provider
//!
//! Talks to an Identity Toolkit compatible service:
//! - `POST {identity_url}/accounts:sendOobCode` with `requestType=EMAIL_SIGNIN`
//! - `POST {identity_url}/accounts:signInWithEmailLink`
//! - `POST {identity_url}/accounts:lookup`
//! - `POST {token_url}/token` with `grant_type=refresh_token`

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};

use super::provider::{
    sign_in_code, AuthListener, IdentityError, IdentityProvider, ListenerId, ListenerSet,
};
use crate::config::IdentityConfig;
use crate::models::SessionUser;

/// Tokens are refreshed this long before they actually expire
const EXPIRY_SKEW_SECONDS: i64 = 300;

#[derive(Debug, Clone)]
struct Credentials {
    user: SessionUser,
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Credentials {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECONDS) < self.expires_at
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendOobCodeRequest<'a> {
    request_type: &'a str,
    email: &'a str,
    continue_url: &'a str,
    can_handle_code_in_app: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithEmailLinkRequest<'a> {
    email: &'a str,
    oob_code: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithEmailLinkResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: String,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LookupResponse {
    users: Vec<LookupUser>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    email_verified: bool,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: String,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: String,
}

/// Identity Toolkit REST client holding one visitor's credentials
pub struct IdentityToolkit {
    http: reqwest::Client,
    config: IdentityConfig,
    credentials: RwLock<Option<Credentials>>,
    listeners: ListenerSet,
}

impl IdentityToolkit {
    /// Create a provider sharing `http` with other visitors
    pub fn new(http: reqwest::Client, config: IdentityConfig) -> Self {
        Self {
            http,
            config,
            credentials: RwLock::new(None),
            listeners: ListenerSet::new(),
        }
    }

    fn endpoint(&self, base: &str, method: &str) -> String {
        format!(
            "{}/{}?key={}",
            base.trim_end_matches('/'),
            method,
            urlencoding::encode(&self.config.api_key)
        )
    }

    async fn call<B, R>(&self, url: String, body: &B) -> Result<R, IdentityError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(&url)
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!("Identity provider call {} -> {}", url.split('?').next().unwrap_or_default(), status);

        if !status.is_success() {
            let code = serde_json::from_slice::<ProviderErrorBody>(&bytes)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            return Err(IdentityError::from_provider_code(&code));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| IdentityError::Provider(format!("Invalid provider response: {}", e)))
    }

    async fn lookup(&self, id_token: &str) -> Result<Option<LookupUser>, IdentityError> {
        let url = self.endpoint(&self.config.identity_url, "accounts:lookup");
        let response: LookupResponse = self.call(url, &LookupRequest { id_token }).await?;
        Ok(response.users.into_iter().next())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, IdentityError> {
        let url = self.endpoint(&self.config.token_url, "token");
        self.call(
            url,
            &RefreshRequest {
                grant_type: "refresh_token",
                refresh_token,
            },
        )
        .await
    }

    fn snapshot(&self) -> Option<Credentials> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, credentials: Option<Credentials>) {
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) = credentials;
    }

    /// Drop the user and tell the listeners, unless already signed out
    fn drop_user(&self) {
        let previous = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            self.listeners.notify(None);
        }
    }
}

fn expires_at(expires_in: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let seconds = expires_in.trim().parse::<i64>().unwrap_or(3600);
    now + Duration::seconds(seconds)
}

#[async_trait]
impl IdentityProvider for IdentityToolkit {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn send_sign_in_link(&self, email: &str, continue_url: &str) -> Result<(), IdentityError> {
        if !self.is_configured() {
            return Err(IdentityError::NotConfigured);
        }

        let url = self.endpoint(&self.config.identity_url, "accounts:sendOobCode");
        let _: serde_json::Value = self
            .call(
                url,
                &SendOobCodeRequest {
                    request_type: "EMAIL_SIGNIN",
                    email,
                    continue_url,
                    can_handle_code_in_app: true,
                },
            )
            .await?;

        info!("Sign-in link sent");
        Ok(())
    }

    async fn sign_in_with_link(&self, email: &str, link: &str) -> Result<SessionUser, IdentityError> {
        if !self.is_configured() {
            return Err(IdentityError::NotConfigured);
        }
        let oob_code = sign_in_code(link).ok_or(IdentityError::InvalidLink)?;

        let url = self.endpoint(&self.config.identity_url, "accounts:signInWithEmailLink");
        let signed_in: SignInWithEmailLinkResponse = self
            .call(url, &SignInWithEmailLinkRequest { email, oob_code: &oob_code })
            .await?;

        let mut user = SessionUser {
            uid: signed_in.local_id.clone(),
            email: signed_in.email.clone().or_else(|| Some(email.to_string())),
            display_name: None,
            photo_url: None,
            // Completing an email link proves ownership of the address
            email_verified: true,
        };

        match self.lookup(&signed_in.id_token).await {
            Ok(Some(profile)) if profile.local_id == user.uid => {
                user.email = profile.email.or(user.email);
                user.display_name = profile.display_name;
                user.photo_url = profile.photo_url;
                user.email_verified = profile.email_verified || user.email_verified;
            }
            Ok(_) => {}
            Err(e) => warn!("Profile lookup after sign-in failed: {}", e),
        }

        self.store(Some(Credentials {
            user: user.clone(),
            id_token: signed_in.id_token,
            refresh_token: signed_in.refresh_token,
            expires_at: expires_at(&signed_in.expires_in, Utc::now()),
        }));
        info!("User {} signed in with email link", user.uid);
        self.listeners.notify(Some(&user));

        Ok(user)
    }

    fn current_user(&self) -> Option<SessionUser> {
        self.snapshot().map(|c| c.user)
    }

    async fn id_token(&self, force_refresh: bool) -> Result<Option<String>, IdentityError> {
        let Some(credentials) = self.snapshot() else {
            return Ok(None);
        };
        let now = Utc::now();
        if !force_refresh && credentials.is_fresh(now) {
            return Ok(Some(credentials.id_token));
        }

        match self.refresh(&credentials.refresh_token).await {
            Ok(refreshed) => {
                let token = refreshed.id_token.clone();
                let mut guard = self.credentials.write().unwrap_or_else(PoisonError::into_inner);
                // A concurrent sign-out wins over this refresh
                if let Some(current) = guard.as_mut().filter(|c| c.user.uid == credentials.user.uid) {
                    current.id_token = refreshed.id_token;
                    current.refresh_token = refreshed.refresh_token;
                    current.expires_at = expires_at(&refreshed.expires_in, now);
                } else {
                    return Ok(None);
                }
                debug!("ID token refreshed for {}", credentials.user.uid);
                Ok(Some(token))
            }
            Err(e) if e.is_session_expired() => {
                warn!("Session of {} expired at the provider", credentials.user.uid);
                self.drop_user();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.drop_user();
        Ok(())
    }

    fn add_listener(&self, listener: AuthListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}

impl std::fmt::Debug for IdentityToolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityToolkit")
            .field("identity_url", &self.config.identity_url)
            .field("configured", &self.config.is_configured())
            .field("signed_in", &self.current_user().is_some())
            .finish()
    }
}

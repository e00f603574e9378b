//! Login and login-callback pages

use serde::Serialize;
use tracing::{info, warn};

use super::{safe_redirect, DEFAULT_AFTER_LOGIN};
use crate::backend::BackendApi;
use crate::identity::{IdentityError, SessionBridge};
use crate::models::SessionUser;
use crate::utils::is_valid_email;

pub const EMAIL_REQUIRED_MESSAGE: &str = "Please enter your email address";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const INVALID_LINK_MESSAGE: &str = "Invalid or expired login link";

/// What the login page shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum LoginView {
    Form {
        email: String,
        error: Option<String>,
    },
    /// The link was sent
    CheckEmail { email: String },
    /// Already signed in
    Redirect { to: String },
}

/// Email-link login form
#[derive(Debug, Clone)]
pub struct LoginFlow {
    redirect: String,
    view: LoginView,
}

impl LoginFlow {
    /// Open the page; a signed-in visitor goes straight on to `redirect`
    pub fn open(bridge: &SessionBridge, redirect: Option<&str>) -> Self {
        let redirect = safe_redirect(redirect, DEFAULT_AFTER_LOGIN);
        let view = if bridge.is_authenticated() {
            LoginView::Redirect { to: redirect.clone() }
        } else {
            LoginView::Form {
                email: String::new(),
                error: None,
            }
        };
        Self { redirect, view }
    }

    pub fn view(&self) -> &LoginView {
        &self.view
    }

    pub fn redirect_target(&self) -> &str {
        &self.redirect
    }

    /// Submit the form
    ///
    /// The email is validated first; only a valid one reaches the provider,
    /// exactly once.
    pub async fn submit(&mut self, bridge: &SessionBridge, email: &str) -> &LoginView {
        let email = email.trim();
        let form_error = |message: &str| LoginView::Form {
            email: email.to_string(),
            error: Some(message.to_string()),
        };

        self.view = if email.is_empty() {
            form_error(EMAIL_REQUIRED_MESSAGE)
        } else if !is_valid_email(email) {
            form_error(INVALID_EMAIL_MESSAGE)
        } else {
            match bridge.send_login_link(email, Some(self.redirect.as_str())).await {
                Ok(()) => LoginView::CheckEmail {
                    email: email.to_string(),
                },
                Err(e) => {
                    warn!("Login error: {}", e);
                    form_error(&e.to_string())
                }
            }
        };
        &self.view
    }

    /// Back to the form from the "check your email" screen
    pub fn use_different_email(&mut self) {
        self.view = LoginView::Form {
            email: String::new(),
            error: None,
        };
    }
}

/// What the callback page shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum CallbackView {
    /// Signed in; continue to `redirect`
    Success { user: SessionUser, redirect: String },
    /// The link was opened without the email it was sent to
    EmailRequired,
    Error { message: String },
}

/// Completes an email-link sign-in
pub struct CallbackFlow<'a> {
    bridge: &'a SessionBridge,
    backend: &'a dyn BackendApi,
}

impl<'a> CallbackFlow<'a> {
    pub fn new(bridge: &'a SessionBridge, backend: &'a dyn BackendApi) -> Self {
        Self { bridge, backend }
    }

    /// Sign in with the clicked `link`, then register with the backend
    ///
    /// A failed backend registration does not undo the sign-in.
    pub async fn complete(&self, link: &str, email: Option<&str>, redirect: Option<&str>) -> CallbackView {
        if !self.bridge.is_configured() {
            return CallbackView::Error {
                message: IdentityError::NotConfigured.to_string(),
            };
        }
        if !self.bridge.is_sign_in_link(link) {
            return CallbackView::Error {
                message: INVALID_LINK_MESSAGE.to_string(),
            };
        }

        let user = match self.bridge.complete_login(link, email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                return CallbackView::Error {
                    message: INVALID_LINK_MESSAGE.to_string(),
                }
            }
            Err(IdentityError::EmailRequired) => return CallbackView::EmailRequired,
            Err(e) => {
                warn!("Auth callback error: {}", e);
                return CallbackView::Error { message: e.to_string() };
            }
        };

        match self.backend.verify_auth().await {
            Ok(verified) => info!("Backend verified user {}", verified.uid),
            Err(e) => warn!("Backend verification failed, continuing: {}", e),
        }

        CallbackView::Success {
            user,
            redirect: safe_redirect(redirect, DEFAULT_AFTER_LOGIN),
        }
    }
}

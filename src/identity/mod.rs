//! Identity: passwordless email-link sign-in
//!
//! `IdentityProvider` is the seam to the identity service; `IdentityToolkit`
//! implements it over REST. `SessionBridge` turns one visitor's provider
//! into observable session state.

mod bridge;
mod provider;
mod toolkit;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{SessionBridge, SessionState, Subscription};
pub use provider::{
    is_email_sign_in_link, sign_in_code, AuthListener, IdentityError, IdentityProvider,
    ListenerId, ListenerSet,
};
pub use toolkit::IdentityToolkit;

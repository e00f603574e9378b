//! Backend REST API access
//!
//! `ApiClient` sends authenticated requests and unwraps the backend's
//! response envelope; `BackendApi` names the endpoints the storefront uses.

mod client;
mod endpoints;
mod error;
mod navigator;

pub use client::{ApiClient, ApiEnvelope, EnvelopeError, TokenSource};
pub use endpoints::{
    BackendApi, AUTH_VERIFY_ENDPOINT, INTERESTS_ENDPOINT, TEST_DRIVES_ENDPOINT, USER_ME_ENDPOINT,
};
pub use error::{codes, ApiError, DEFAULT_ERROR_MESSAGE};
pub use navigator::{login_location, Navigator, RecordingNavigator, LOGIN_ROUTE};

#[cfg(test)]
pub(crate) use client::test_support;

//! AutoStack - A car marketplace storefront
//!
//! This library provides the storefront's building blocks: typed catalog
//! reads from a headless CMS, email-link sign-in, the authenticated backend
//! client, per-page presentation state and the HTTP layer serving it.

pub mod api;
pub mod backend;
pub mod config;
pub mod content;
pub mod identity;
pub mod models;
pub mod storefront;
pub mod utils;

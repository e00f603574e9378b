//! Formatting and validation helpers shared by the storefront pages

pub mod format;
pub mod validate;

pub use format::{format_price, format_price_full, DateStyle};
pub use validate::{is_valid_email, ValidationRule};

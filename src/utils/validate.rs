//! Form validators
//!
//! Every check here runs before any network call; a failing check blocks
//! the submission.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[6-9]\d{9}$").unwrap());
static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z\s]{2,50}$").unwrap());

/// Highest price accepted by price filters
pub const MAX_PRICE: f64 = 100_000_000.0;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Indian mobile number, spaces ignored
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&compact)
}

/// Letters and spaces only, 2 to 50 characters after trimming
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name.trim())
}

/// True only for dates strictly after `today`
pub fn is_future_date(date: NaiveDate, today: NaiveDate) -> bool {
    date > today
}

/// True when `date` lies in `[today + min_days, today + max_days]`
pub fn is_date_in_range(date: NaiveDate, today: NaiveDate, min_days: i64, max_days: i64) -> bool {
    date >= today + Duration::days(min_days) && date <= today + Duration::days(max_days)
}

pub fn is_required(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn has_min_length(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

pub fn has_max_length(value: &str, max: usize) -> bool {
    value.trim().chars().count() <= max
}

pub fn is_valid_price(price: f64) -> bool {
    is_price_in_range(price, 0.0, MAX_PRICE)
}

pub fn is_price_in_range(price: f64, min: f64, max: f64) -> bool {
    price >= min && price <= max
}

/// A single check on a form field plus the message shown when it fails
pub struct ValidationRule {
    check: Box<dyn Fn(&str) -> bool + Send + Sync>,
    message: String,
}

impl ValidationRule {
    pub fn new<F>(message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            check: Box::new(check),
            message: message.into(),
        }
    }

    pub fn required(message: impl Into<String>) -> Self {
        Self::new(message, is_required)
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::new(message, is_valid_email)
    }

    pub fn phone(message: impl Into<String>) -> Self {
        Self::new(message, is_valid_phone)
    }

    pub fn name(message: impl Into<String>) -> Self {
        Self::new(message, is_valid_name)
    }

    pub fn min_length(min: usize, message: impl Into<String>) -> Self {
        Self::new(message, move |v| has_min_length(v, min))
    }

    pub fn max_length(max: usize, message: impl Into<String>) -> Self {
        Self::new(message, move |v| has_max_length(v, max))
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn validate(&self, value: &str) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("message", &self.message)
            .finish()
    }
}

/// Message of the first failing rule, `None` when all pass
pub fn validate_field(value: &str, rules: &[ValidationRule]) -> Option<String> {
    rules
        .iter()
        .find(|rule| !rule.validate(value))
        .map(|rule| rule.message.clone())
}

/// Per-field validation result; a field missing from `data` validates as empty
pub type FormErrors = BTreeMap<String, Option<String>>;

pub fn validate_form(
    data: &BTreeMap<String, String>,
    rules: &BTreeMap<String, Vec<ValidationRule>>,
) -> FormErrors {
    rules
        .iter()
        .map(|(field, field_rules)| {
            let value = data.get(field).map(String::as_str).unwrap_or("");
            (field.clone(), validate_field(value, field_rules))
        })
        .collect()
}

pub fn has_errors(errors: &FormErrors) -> bool {
    errors.values().any(Option::is_some)
}

//! Display formatters
//!
//! Prices follow the Indian numbering system (lakh = 1,00,000,
//! crore = 1,00,00,000); dates follow the `en-IN` conventions.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;

/// Format a price in rupees, abbreviating lakh and crore amounts
///
/// `1245000` becomes `₹12.45 Lakh`, `15000000` becomes `₹1.50 Cr` and
/// smaller amounts are grouped in full, e.g. `₹85,000`.
pub fn format_price(price: f64) -> String {
    if price >= CRORE {
        format!("₹{:.2} Cr", price / CRORE)
    } else if price >= LAKH {
        format!("₹{:.2} Lakh", price / LAKH)
    } else {
        format_price_full(price)
    }
}

/// Format a price in rupees without abbreviation, e.g. `₹12,45,000`
pub fn format_price_full(price: f64) -> String {
    let rounded = price.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}₹{}", sign, group_indian(rounded.abs() as u64))
}

/// Group digits the Indian way: last three, then pairs
fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Date presentation styles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateStyle {
    /// `15 Jan 2024`
    #[default]
    Short,
    /// `15 January 2024`
    Long,
    /// `3 days ago`
    Relative,
}

/// Parse a CMS or backend date: RFC 3339 timestamps or plain `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn format_date(date: NaiveDate, style: DateStyle) -> String {
    match style {
        DateStyle::Short => date.format("%-d %b %Y").to_string(),
        DateStyle::Long => date.format("%-d %B %Y").to_string(),
        DateStyle::Relative => format_relative_date(date, Local::now().date_naive()),
    }
}

/// Format a date string, falling back to the raw value when it does not parse
pub fn format_date_str(value: &str, style: DateStyle) -> String {
    match parse_date(value) {
        Some(date) => format_date(date, style),
        None => value.to_string(),
    }
}

/// Describe how long ago `date` was, relative to `today`
pub fn format_relative_date(date: NaiveDate, today: NaiveDate) -> String {
    let days = (today - date).num_days();

    fn plural(n: i64, unit: &str) -> String {
        format!("{} {}{} ago", n, unit, if n > 1 { "s" } else { "" })
    }

    match days {
        i64::MIN..=0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{} days ago", days),
        7..=29 => plural(days / 7, "week"),
        30..=364 => plural(days / 30, "month"),
        _ => plural(days / 365, "year"),
    }
}

/// `YYYY-MM-DD`, as used by date inputs
pub fn format_date_for_input(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 12-hour clock time, e.g. `02:30 pm`
pub fn format_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String {
    let (pm, hour) = time.hour12();
    format!("{:02}:{:02} {}", hour, time.minute(), if pm { "pm" } else { "am" })
}

pub fn format_mileage(mileage: &str) -> String {
    if mileage.contains("km") {
        mileage.to_string()
    } else {
        format!("{} km/l", mileage)
    }
}

pub fn format_engine_capacity(cc: &str) -> String {
    if cc.contains("cc") {
        cc.to_string()
    } else {
        format!("{} cc", cc)
    }
}

pub fn format_power(power: &str) -> String {
    if power.contains("bhp") || power.contains("HP") {
        power.to_string()
    } else {
        format!("{} bhp", power)
    }
}

/// Upper-case the first character and lower-case the rest
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let rest = chars.as_str().to_lowercase();
            first.to_uppercase().chain(rest.chars()).collect()
        }
        None => String::new(),
    }
}

pub fn to_title_case(s: &str) -> String {
    s.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `text` to `max_len` characters and append `...`
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_len).collect();
    format!("{}...", cut.trim())
}

/// Format a ten-digit Indian mobile number as `+91 98765 43210`
///
/// Anything that does not reduce to ten digits is returned unchanged.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("+91 {} {}", &digits[..5], &digits[5..])
    } else {
        phone.to_string()
    }
}

static SLUG_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").unwrap());
static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_-]+").unwrap());

pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(lower.trim(), "");
    let joined = SLUG_SEPARATORS.replace_all(&stripped, "-");
    joined.trim_matches('-').to_string()
}

/// `2024 Tata Nexon`, or `Tata Nexon` without a year
pub fn format_car_title(brand: &str, model: &str, year: Option<i32>) -> String {
    match year {
        Some(year) if year != 0 => format!("{} {} {}", year, brand, model),
        _ => format!("{} {}", brand, model),
    }
}

/// Badge text for a backend status value
pub fn format_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "requested" => "Requested".to_string(),
        "confirmed" => "Confirmed".to_string(),
        "completed" => "Completed".to_string(),
        "cancelled" => "Cancelled".to_string(),
        "pending" => "Pending".to_string(),
        "active" => "Active".to_string(),
        _ => to_title_case(status),
    }
}

//! Display helpers for text output

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

pub const DEFAULT_CURRENCY: &str = "ETB";

/// `$1,234.50`, `ETB 1,234.50`, `-€12.00`
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let code = currency.trim().to_ascii_uppercase();
    let code = if code.is_empty() { DEFAULT_CURRENCY.to_string() } else { code };

    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = group_thousands(rounded.abs(), 2, 2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };

    match currency_symbol(&code) {
        Some(symbol) => format!("{}{}{}", sign, symbol, digits),
        None => format!("{}{} {}", sign, code, digits),
    }
}

/// At most two decimals, trailing zeros dropped: `12.5%`
pub fn format_percentage(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{}%", rounded.normalize())
}

/// Thousands separators, up to three decimals
pub fn format_number(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{}", sign, group_thousands(rounded.abs(), 0, 3))
}

/// `Jan 05, 2024` from a date or timestamp string; anything unparseable is
/// returned as given
pub fn format_date(value: &str) -> String {
    let value = value.trim();
    let date = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok());

    match date {
        Some(date) => date.format("%b %d, %Y").to_string(),
        None => value.to_string(),
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

fn group_thousands(value: Decimal, min_fraction: usize, max_fraction: u32) -> String {
    let text = value.round_dp(max_fraction).normalize().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole.to_string(), fraction.to_string()),
        None => (text.clone(), String::new()),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut fraction = fraction;
    while fraction.len() < min_fraction {
        fraction.push('0');
    }
    if fraction.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, fraction)
    }
}

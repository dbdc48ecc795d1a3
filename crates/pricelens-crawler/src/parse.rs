//! Shared normalization helpers for raw platform text.
//!
//! Every adapter funnels upstream price strings, sales-count shorthand, and
//! half-complete URLs through these before a record is emitted.

/// Parses a currency string into a number by stripping everything that is
/// not a digit or decimal point. Absence or parse failure yields `0`.
///
/// `"NT$ 1,299"` → `1299.0`, `"¥88.50"` → `88.5`, `""` → `0.0`.
#[must_use]
pub fn parse_price(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Expands sales-count shorthand into a plain count.
///
/// `"12.3k"` → `12300`, `"1.2萬"` / `"1.2万"` → `12000`, `"3,456"` → `3456`,
/// unparsable input → `0`.
#[must_use]
pub fn parse_sales(raw: &str) -> u64 {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return 0;
    }
    if lowered.contains('k') {
        return scale_decimal(&lowered, 1_000.0);
    }
    if lowered.contains('萬') || lowered.contains('万') {
        return scale_decimal(&lowered, 10_000.0);
    }
    let digits: String = lowered.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_decimal(raw: &str, factor: f64) -> u64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = cleaned.parse().unwrap_or(0.0);
    (value * factor).round().max(0.0) as u64
}

/// Trims and collapses internal whitespace runs to single spaces.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Completes a possibly-relative URL against an adapter's base URL.
///
/// Absolute URLs pass through, protocol-relative `//…` gains `https:`, and
/// relative paths are prefixed with the base.
#[must_use]
pub fn complete_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_owned();
    }
    if href.starts_with("//") {
        return format!("https:{href}");
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}

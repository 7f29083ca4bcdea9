//! Light formatters applied to every captured fragment.

use regex::Regex;
use shared_types::{DateLocale, DateValue, ExtractionError};

/// Compile a pattern that is part of a parser's fixed rule set.
///
/// Patterns are literals in this crate, so failing to compile is a programming
/// error caught by the parser tests.
pub(crate) fn pattern(source: &str) -> Regex {
    Regex::new(source).unwrap_or_else(|e| panic!("invalid parser pattern {source:?}: {e}"))
}

/// First capture group of the first match, if any.
pub fn capture<'t>(regex: &Regex, text: &'t str) -> Option<&'t str> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Trimmed capture, empty when the pattern did not match.
pub fn string(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Numeric coercion of a captured amount.
///
/// Every `separator` is stripped and `decimals_separator` becomes a dot before
/// casting. A missing or blank capture is zero; anything else that does not
/// cast is an error.
pub fn numeric(
    field: &'static str,
    value: Option<&str>,
    separator: char,
    decimals_separator: char,
) -> Result<f64, ExtractionError> {
    let value = string(value);
    if value.is_empty() {
        return Ok(0.0);
    }

    let cleaned: String = value
        .chars()
        .filter(|c| *c != separator)
        .map(|c| if c == decimals_separator { '.' } else { c })
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(ExtractionError::InvalidNumber { field, value })
}

/// Hand a raw date to the date utility.
pub fn date(raw: &str, format: Option<&str>) -> DateValue {
    tracing::debug!(raw, format, "Formatting date");
    DateValue::parse(raw, format)
}

/// Rebuild `DD/MM/YYYY` out of a day number, a spelled month and a year.
///
/// Returns `None` when any of the three parts cannot be read, so callers can
/// fall back to a numeric format.
pub fn spelled_date(day: &str, month: &str, year: &str, locale: DateLocale) -> Option<String> {
    let day: u32 = day.trim().parse().ok()?;
    let month = locale.month_two_digits(month)?;
    let year = year.trim();

    if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(format!("{:02}/{}/{}", day, month, year))
}

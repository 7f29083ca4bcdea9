use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Rendered in place of a formatted date when the value is invalid.
pub const INVALID_DATE: &str = "Invalid Date";

/// Locale used to read month names out of message bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateLocale {
    #[default]
    Es,
    En,
}

const ES_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const EN_MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

impl DateLocale {
    fn months(&self) -> &'static [&'static str; 12] {
        match self {
            DateLocale::Es => &ES_MONTHS,
            DateLocale::En => &EN_MONTHS,
        }
    }

    /// Month number (1-12) for a spelled-out month name.
    pub fn month_number(&self, name: &str) -> Option<u32> {
        let name = name.trim().to_lowercase();

        // Chilean and Peruvian banks spell it both ways
        if *self == DateLocale::Es && name == "setiembre" {
            return Some(9);
        }

        self.months()
            .iter()
            .position(|month| *month == name)
            .map(|index| index as u32 + 1)
    }

    /// Two-digit month for a spelled-out month name, e.g. `julio` -> `07`.
    pub fn month_two_digits(&self, name: &str) -> Option<String> {
        self.month_number(name).map(|month| format!("{:02}", month))
    }
}

/// Parsed date produced by the date utility. `None` marks an invalid date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateValue(Option<NaiveDateTime>);

impl DateValue {
    pub fn invalid() -> Self {
        Self(None)
    }

    /// Parse `raw` using a day.js style format (`DD/MM/YYYY HH:mm`).
    ///
    /// Without a format only ISO-like inputs are understood. Anything that
    /// cannot be parsed yields the invalid value.
    pub fn parse(raw: &str, format: Option<&str>) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::invalid();
        }

        match format.filter(|f| !f.trim().is_empty()) {
            Some(format) => Self::parse_with(raw, &translate_tokens(format)),
            None => Self::parse_iso(raw),
        }
    }

    fn parse_with(raw: &str, chrono_format: &str) -> Self {
        if let Ok(value) = NaiveDateTime::parse_from_str(raw, chrono_format) {
            return Self(Some(value));
        }

        NaiveDate::parse_from_str(raw, chrono_format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .into()
    }

    fn parse_iso(raw: &str) -> Self {
        if let Ok(value) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Self(Some(value.naive_local()));
        }

        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(value) = NaiveDateTime::parse_from_str(raw, format) {
                return Self(Some(value));
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .into()
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn value(&self) -> Option<NaiveDateTime> {
        self.0
    }

    /// Render with day.js style tokens, e.g. `YYYY-MM-DD` or `HH:mm`.
    pub fn format(&self, tokens: &str) -> String {
        match self.0 {
            Some(value) => value.format(&translate_tokens(tokens)).to_string(),
            None => INVALID_DATE.to_string(),
        }
    }
}

impl From<Option<NaiveDateTime>> for DateValue {
    fn from(value: Option<NaiveDateTime>) -> Self {
        Self(value)
    }
}

const TOKENS: [(&str, &str); 7] = [
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("mm", "%M"),
    ("ss", "%S"),
];

/// Translate day.js format tokens into a chrono format string.
fn translate_tokens(format: &str) -> String {
    let mut translated = String::with_capacity(format.len() + 8);
    let mut rest = format;

    'outer: while !rest.is_empty() {
        for (token, replacement) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                translated.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '%' {
                translated.push_str("%%");
            } else {
                translated.push(c);
            }
        }
        rest = chars.as_str();
    }

    translated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_translate_tokens() {
        assert_eq!(translate_tokens("DD/MM/YYYY HH:mm"), "%d/%m/%Y %H:%M");
        assert_eq!(translate_tokens("DD/MM/YYYY HH:mm:ss"), "%d/%m/%Y %H:%M:%S");
        assert_eq!(translate_tokens("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(translate_tokens("100%"), "100%%");
    }

    #[test]
    fn test_parse_date_and_time() {
        let date = DateValue::parse("27/06/2020 13:08", Some("DD/MM/YYYY HH:mm"));
        assert!(date.is_valid());
        assert_eq!(date.format("YYYY-MM-DD"), "2020-06-27");
        assert_eq!(date.format("HH:mm"), "13:08");
    }

    #[test]
    fn test_parse_date_only_format() {
        let date = DateValue::parse("13/07/2020", Some("DD/MM/YYYY"));
        let value = date.value().unwrap();
        assert_eq!((value.year(), value.month(), value.day()), (2020, 7, 13));
        assert_eq!(value.hour(), 0);
    }

    #[test]
    fn test_parse_with_seconds() {
        let date = DateValue::parse("21/07/2020 11:39:20", Some("DD/MM/YYYY HH:mm:ss"));
        assert_eq!(date.format("YYYY-MM-DD HH:mm:ss"), "2020-07-21 11:39:20");
    }

    #[test]
    fn test_parse_without_format() {
        assert!(DateValue::parse("2020-07-13", None).is_valid());
        assert!(DateValue::parse("2020-07-13T10:00:00", None).is_valid());
        assert!(DateValue::parse("2020-07-13T10:00:00-04:00", None).is_valid());
        assert!(!DateValue::parse("13 de julio 2020", None).is_valid());
    }

    #[test]
    fn test_invalid_inputs_never_panic() {
        assert!(!DateValue::parse("", Some("DD/MM/YYYY")).is_valid());
        assert!(!DateValue::parse("   ", None).is_valid());
        assert!(!DateValue::parse("31/02/2020", Some("DD/MM/YYYY")).is_valid());
        assert!(!DateValue::parse("13/xx/2020", Some("DD/MM/YYYY")).is_valid());
        assert_eq!(DateValue::invalid().format("YYYY-MM-DD"), INVALID_DATE);
    }

    #[test]
    fn test_month_names() {
        assert_eq!(DateLocale::Es.month_number("julio"), Some(7));
        assert_eq!(DateLocale::Es.month_number(" Diciembre "), Some(12));
        assert_eq!(DateLocale::Es.month_number("setiembre"), Some(9));
        assert_eq!(DateLocale::Es.month_two_digits("enero").as_deref(), Some("01"));
        assert_eq!(DateLocale::Es.month_number("july"), None);
        assert_eq!(DateLocale::En.month_number("July"), Some(7));
    }

    #[test]
    fn test_serializes_as_iso_or_null() {
        let date = DateValue::parse("13/07/2020", Some("DD/MM/YYYY"));
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2020-07-13T00:00:00\"");
        assert_eq!(serde_json::to_string(&DateValue::invalid()).unwrap(), "null");
    }
}

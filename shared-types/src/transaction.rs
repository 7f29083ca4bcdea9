use crate::date::DateValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Direction of the money movement a notification describes.
///
/// `Alert` covers incoming payments that are announced but not settled yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Expense,
    Deposit,
    Alert,
    Other,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Deposit => "deposit",
            TransactionType::Alert => "alert",
            TransactionType::Other => "other",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currency attached to every record a parser emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub name: String,
    pub symbol: String,
    pub code: String, // ISO 4217
    pub country: String,
    pub locale: String,
    pub symbol_prefix: bool,
    pub separator: char,
    pub decimals: u32,
    pub decimals_separator: char,
}

impl Currency {
    pub fn clp() -> Self {
        Self {
            name: "Peso Chileno".to_string(),
            symbol: "$".to_string(),
            code: "CLP".to_string(),
            country: "Chile".to_string(),
            locale: "es-CL".to_string(),
            symbol_prefix: true,
            separator: '.',
            decimals: 0,
            decimals_separator: ',',
        }
    }

    /// Human readable amount, e.g. `$ 12.345 CLP`.
    pub fn format(&self, value: f64) -> String {
        let rounded = format!("{:.*}", self.decimals as usize, value.abs());
        let (whole, fraction) = match rounded.split_once('.') {
            Some((whole, fraction)) => (whole.to_string(), Some(fraction.to_string())),
            None => (rounded, None),
        };

        let mut grouped = String::new();
        for (index, digit) in whole.chars().enumerate() {
            if index > 0 && (whole.len() - index) % 3 == 0 {
                grouped.push(self.separator);
            }
            grouped.push(digit);
        }

        if let Some(fraction) = fraction {
            grouped.push(self.decimals_separator);
            grouped.push_str(&fraction);
        }

        let sign = if value < 0.0 { "-" } else { "" };

        if self.symbol_prefix {
            format!("{}{} {} {}", sign, self.symbol, grouped, self.code)
        } else {
            format!("{}{} {} {}", sign, grouped, self.symbol, self.code)
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::clp()
    }
}

/// Date captured from a message body plus its parsed value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDate {
    pub raw: String,
    pub formatter: DateValue,
}

/// Canonical record extracted from a notification message.
///
/// Consumers must only use a record when `parsed` is true. Parsers hand back
/// the untouched default record to signal that nothing could be extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Amount found in the message, without currency minor units
    pub amount: f64,
    /// Store, person or similar info giving context to the transaction
    pub context: String,
    /// Card number, account or other origin of the transaction
    pub account: String,
    pub date: TransactionDate,
    /// Name of the parser that produced this record
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub label: String,
    pub entity: String,
    pub currency: Currency,
    /// Entity specific extras that do not fit elsewhere
    pub meta: BTreeMap<String, String>,
    pub comment: String,
    /// Extraction time in unix milliseconds
    pub created_at: i64,
    pub version: String,
    pub parsed: bool,
}

impl TransactionRecord {
    pub fn is_usable(&self) -> bool {
        self.parsed
    }
}

use serde::Serialize;
use shared_types::{
    Currency, DateLocale, ExtractionError, RawMessage, TransactionDate, TransactionRecord,
    TransactionType,
};
use std::collections::BTreeMap;

/// Static identity every parser declares
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParserIdentity {
    pub name: String,
    /// Label in `{type}:{country}-{entity}:{context}` form
    pub label: String,
    pub entity: String,
    pub kind: TransactionType,
    pub currency: Currency,
    pub version: String,
}

impl ParserIdentity {
    /// The record a parser returns when it finds nothing to extract.
    pub fn default_record(&self, created_at: i64) -> TransactionRecord {
        TransactionRecord {
            amount: 0.0,
            context: String::new(),
            account: String::new(),
            date: TransactionDate::default(),
            name: self.name.clone(),
            kind: self.kind,
            label: self.label.clone(),
            entity: self.entity.clone(),
            currency: self.currency.clone(),
            meta: BTreeMap::new(),
            comment: String::new(),
            created_at,
            version: self.version.clone(),
            parsed: false,
        }
    }
}

/// Run configuration handed to every parse call
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    pub locale: DateLocale,
    /// Extraction time stamped on records, unix milliseconds
    pub created_at: i64,
}

impl ParseContext {
    pub fn new(locale: DateLocale) -> Self {
        Self {
            locale,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Same settings, with `created_at` moved to now.
    pub fn restamped(&self) -> Self {
        Self {
            created_at: chrono::Utc::now().timestamp_millis(),
            ..*self
        }
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new(DateLocale::default())
    }
}

/// Contract shared by every entity specific rule set.
///
/// `parse` returns the default record (`parsed == false`) when the body holds
/// nothing to extract. An `Err` means a captured fragment could not be coerced.
pub trait TransactionParser: Send + Sync {
    fn identity(&self) -> &ParserIdentity;

    fn parse(
        &self,
        message: &RawMessage,
        context: &ParseContext,
    ) -> Result<TransactionRecord, ExtractionError>;
}

/// True when a body carries nothing worth matching against.
pub fn is_empty_body(body: &str) -> bool {
    body.trim().is_empty()
}

use super::{identity, labels};
use crate::formatters::{self, capture, pattern};
use crate::parser::{is_empty_body, ParseContext, ParserIdentity, TransactionParser};
use regex::Regex;
use shared_types::{
    DateLocale, ExtractionError, RawMessage, TransactionDate, TransactionRecord, TransactionType,
};

/// Donations received through the bank's donation service.
///
/// The date reads like "13 de julio 2020", donor details follow as
/// `Nombre:`, `RUT:` and `Banco:` lines.
pub struct DonationParser {
    identity: ParserIdentity,
    date: Regex,
    amount: Regex,
    name: Regex,
    rut: Regex,
    bank: Regex,
}

impl DonationParser {
    pub fn new() -> Self {
        Self {
            identity: identity(TransactionType::Deposit, "Donation", labels::DONATION),
            date: pattern(r"(?i)te\s*informamos\s*que\s*hoy[ *]*([\w ]+)"),
            amount: pattern(r"(?i)recibida\s*:[ *$]*([\d.,]+)"),
            name: pattern(r"(?i)nombre[ \t*]*:[\s*]*([\w ]+)"),
            rut: pattern(r"(?i)rut[ \t*]*:[\s*]*([\w.\-]+)"),
            bank: pattern(r"(?i)banco[ \t*]*:[\s*]*([\w ]+)"),
        }
    }

    fn date(&self, body: &str, locale: DateLocale) -> TransactionDate {
        let value = formatters::string(capture(&self.date, body));
        let parts: Vec<&str> = value.split_whitespace().collect();

        // 13 de julio 2020
        if let [day, _, month, rest @ ..] = parts.as_slice() {
            let year = rest.first().copied().unwrap_or_default();

            if let Some(date) = formatters::spelled_date(day, month, year, locale) {
                return TransactionDate {
                    formatter: formatters::date(&date, Some("DD/MM/YYYY")),
                    raw: value,
                };
            }
        }

        tracing::warn!(%value, "Could not format donation date");
        TransactionDate {
            formatter: formatters::date(&value, None),
            raw: value,
        }
    }
}

impl Default for DonationParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionParser for DonationParser {
    fn identity(&self) -> &ParserIdentity {
        &self.identity
    }

    fn parse(
        &self,
        message: &RawMessage,
        context: &ParseContext,
    ) -> Result<TransactionRecord, ExtractionError> {
        let record = self.identity.default_record(context.created_at);
        let body = message.body();

        tracing::debug!(
            id = %message.id,
            parser = %self.identity.name,
            version = %self.identity.version,
            "Parsing email"
        );

        if is_empty_body(body) {
            tracing::warn!(id = %message.id, "Empty body, nothing to parse");
            return Ok(record);
        }

        let currency = &self.identity.currency;
        let amount = formatters::numeric(
            "amount",
            capture(&self.amount, body),
            currency.separator,
            currency.decimals_separator,
        )?;

        Ok(TransactionRecord {
            date: self.date(body, context.locale),
            amount,
            comment: formatters::string(capture(&self.name, body)),
            account: formatters::string(capture(&self.rut, body)),
            context: formatters::string(capture(&self.bank, body)),
            parsed: true,
            ..record
        })
    }
}

use super::{identity, labels};
use crate::formatters::{self, capture, pattern};
use crate::parser::{is_empty_body, ParseContext, ParserIdentity, TransactionParser};
use regex::Regex;
use shared_types::{
    ExtractionError, RawMessage, TransactionDate, TransactionRecord, TransactionType,
};

const DATE_FORMAT: &str = "DD/MM/YYYY HH:mm";

/// Card purchase notifications.
///
/// "Se ha realizado una compra por $12.345 en ACME asociado a su tarjeta
/// terminada en 1234 el dia 27/06/2020 a las 13:08 hrs"
pub struct PurchaseParser {
    identity: ParserIdentity,
    amount: Regex,
    context: Regex,
    account: Regex,
    day: Regex,
    hour: Regex,
}

impl PurchaseParser {
    pub fn new() -> Self {
        Self {
            identity: identity(TransactionType::Expense, "Purchase", labels::PURCHASE),
            amount: pattern(r"(?i)se\s*ha\s*realizado\s*una\s*compra\s*por\s*\$\s*([\d.,]+)"),
            context: pattern(
                r"(?i)se\s*ha\s*realizado\s*una\s*compra\s*por\s*\$?\s*[\d.,]*\s*en\s*([\s\S]+?)\s*asociado\s*a\s*su\s*tarjeta\s*terminada",
            ),
            account: pattern(r"(?i)tarjeta\s*terminada\s*en\s*([\s\S]+?)\s+el\s+d[ií]a\b"),
            // Merchant names may contain "el dia" ("HOTEL DIAMANTE"), so both
            // words must stand alone and follow the card clause
            day: pattern(
                r"(?i)terminada\s*en\s*\S+\s+el\s+d[ií]a\s+(\S+)\s*a\s*las\b",
            ),
            hour: pattern(
                r"(?i)terminada\s*en\s*\S+\s+el\s+d[ií]a\s+\S+\s*a\s*las\s*([\s\S]+?)\s*hrs",
            ),
        }
    }

    fn date(&self, body: &str) -> TransactionDate {
        let day = formatters::string(capture(&self.day, body));
        let hour = formatters::string(capture(&self.hour, body));
        tracing::debug!(%day, %hour, "Purchase date parts");

        let raw = format!("{} {}", day, hour).trim().to_string();
        let formatter = formatters::date(&raw, Some(DATE_FORMAT));

        TransactionDate { raw, formatter }
    }
}

impl Default for PurchaseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionParser for PurchaseParser {
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

        tracing::debug!(id = %message.id, parser = %self.identity.name, "Parsing email");

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
            amount,
            context: formatters::string(capture(&self.context, body)),
            account: formatters::string(capture(&self.account, body)),
            date: self.date(body),
            parsed: true,
            ..record
        })
    }
}

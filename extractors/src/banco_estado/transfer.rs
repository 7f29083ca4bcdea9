use super::{identity, labels};
use crate::formatters::{self, capture, pattern};
use crate::parser::{is_empty_body, ParseContext, ParserIdentity, TransactionParser};
use regex::Regex;
use shared_types::{
    DateLocale, ExtractionError, RawMessage, TransactionDate, TransactionRecord, TransactionType,
};
use std::collections::BTreeMap;

const SPELLED_FORMAT: &str = "DD/MM/YYYY";
const NUMERIC_FORMAT: &str = "DD/MM/YYYY HH:mm:ss";

/// Electronic fund transfers (TEF) received from another customer.
///
/// The plain text body comes with `*bold*` markers around labels and values.
/// Its date is either spelled out ("13 de julio de 2020") or a numeric
/// timestamp ("21/07/2020 11:39:20").
pub struct TransferParser {
    identity: ParserIdentity,
    date: Regex,
    from: Regex,
    to: Regex,
    amount: Regex,
    rut: Regex,
    bank: Regex,
    account: Regex,
    operation: Regex,
    comment: Regex,
}

impl TransferParser {
    pub fn new() -> Self {
        Self {
            identity: identity(TransactionType::Deposit, "Transfer", labels::TRANSFER),
            date: pattern(
                r"(?i)\(tef\)[\s\S]*?te\s*informamos\s*que\s*hoy\s*\*([\s\S]+?)\*,\s*has\s*recibido\s*una\s*transferencia",
            ),
            from: pattern(r"(?i),\s*de\s*nuestro\(a\)\s*cliente\s*\*([\s\S]+?)\*,"),
            to: pattern(r"(?i)nombre\*\s*\*:\*([\s\S]+?)\s*\*rut"),
            amount: pattern(r"(?i)monto\s*transferido:\s*\*\$([\w.,]+)"),
            rut: pattern(r"(?i)rut\*\s*\*:\*\s*(\S+)\s*\*banco\*"),
            bank: pattern(r"(?i)\*banco\*\s*\*:\*\s*([\s\S]+?)\s*\*n\S*\s*de\s*cuenta\*"),
            account: pattern(
                r"(?i)\*n\S*\s*de\s*cuenta\*\s*\*:\*\s*([\s\S]+?)\s*\*n\S*\s*de\s*operaci",
            ),
            operation: pattern(
                r"(?i)\*n\S*\s*de\s*operaci\S*\s*\*:\*\s*([\s\S]+?)\s*\*comentario\*",
            ),
            comment: pattern(r"(?i)\*comentario\*\s*\*:\*([\s\S]*?)(?:\[image:|\z)"),
        }
    }

    fn date(&self, body: &str, locale: DateLocale) -> TransactionDate {
        let value = formatters::string(capture(&self.date, body));
        let parts: Vec<&str> = value.split_whitespace().collect();
        tracing::debug!(%value, ?parts, "Transfer date components");

        // A third token means the month is spelled out: 13 de julio de 2020
        if let [day, _, month, rest @ ..] = parts.as_slice() {
            let year = rest.get(1).copied().unwrap_or_default();

            let formatter = match formatters::spelled_date(day, month, year, locale) {
                Some(date) => formatters::date(&date, Some(SPELLED_FORMAT)),
                None => {
                    tracing::warn!(%value, "Could not format transfer date");
                    formatters::date(&value, None)
                }
            };

            return TransactionDate {
                formatter,
                raw: value,
            };
        }

        // 21/07/2020 11:39:20
        TransactionDate {
            formatter: formatters::date(&value, Some(NUMERIC_FORMAT)),
            raw: value,
        }
    }
}

impl Default for TransferParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionParser for TransferParser {
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
        let rut = formatters::string(capture(&self.rut, body));

        let mut meta = BTreeMap::new();
        meta.insert("from".to_string(), formatters::string(capture(&self.from, body)));
        meta.insert("to".to_string(), formatters::string(capture(&self.to, body)));
        meta.insert("rut".to_string(), rut.clone());
        meta.insert("entity".to_string(), formatters::string(capture(&self.bank, body)));
        meta.insert(
            "transaction".to_string(),
            formatters::string(capture(&self.operation, body)),
        );

        Ok(TransactionRecord {
            amount,
            context: rut,
            account: formatters::string(capture(&self.account, body)),
            comment: formatters::string(capture(&self.comment, body)),
            date: self.date(body, context.locale),
            meta,
            parsed: true,
            ..record
        })
    }
}

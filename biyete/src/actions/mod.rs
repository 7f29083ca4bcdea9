//! Delivery actions run over the accepted emails of a pass.

pub mod csv_sheet;
pub mod json_payload;

use crate::helpers::query_builder::ParserBinding;
use crate::jobs::ingestion::Email;
use anyhow::{Context, Result};
use shared_types::TransactionRecord;

pub use csv_sheet::CsvSheetAction;
pub use json_payload::JsonPayloadAction;

pub const DAY_FORMAT: &str = "YYYY-MM-DD";
pub const HOUR_FORMAT: &str = "HH:mm";

pub trait Action {
    fn name(&self) -> &str;

    fn run(&mut self, email: &Email) -> Result<()>;
}

/// Run every action over every email. Failures are logged and counted.
pub fn run_actions(actions: &mut [Box<dyn Action>], emails: &[Email]) -> usize {
    let mut failures = 0;

    for email in emails {
        for action in actions.iter_mut() {
            tracing::debug!(id = %email.message.id, action = action.name(), "Running action");

            if let Err(e) = action.run(email) {
                tracing::warn!(
                    id = %email.message.id,
                    action = action.name(),
                    "Action failed: {:#}",
                    e
                );
                failures += 1;
            }
        }
    }

    failures
}

/// Binding and record of an accepted email
pub(crate) fn accepted(email: &Email) -> Result<(&ParserBinding, &TransactionRecord)> {
    let binding = email
        .element
        .as_ref()
        .with_context(|| format!("Email {} has no parser binding", email.message.id))?;
    let info = email
        .info
        .as_ref()
        .with_context(|| format!("Email {} has no transaction record", email.message.id))?;

    Ok((binding, info))
}

/// Sent date as RFC 3339, empty when unknown
pub(crate) fn sent_at(email: &Email) -> String {
    email
        .message
        .date_sent
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}


#[cfg(test)]
mod tests {
    use super::test_support::accepted_email;
    use super::*;

    struct Failing;

    impl Action for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn run(&mut self, _email: &Email) -> Result<()> {
            anyhow::bail!("endpoint unreachable")
        }
    }

    struct Counting(usize);

    impl Action for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn run(&mut self, _email: &Email) -> Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    #[test]
    fn test_failures_do_not_stop_other_actions() {
        let emails = vec![accepted_email(), accepted_email()];
        let mut actions: Vec<Box<dyn Action>> = vec![Box::new(Failing), Box::new(Counting(0))];

        let failures = run_actions(&mut actions, &emails);

        assert_eq!(failures, 2);
    }

    #[test]
    fn test_accepted_requires_record() {
        let mut email = accepted_email();
        assert!(accepted(&email).is_ok());

        email.info = None;
        assert!(accepted(&email).is_err());
    }

    #[test]
    fn test_sent_at() {
        let mut email = accepted_email();
        assert_eq!(sent_at(&email), "2020-06-27T15:08:00+00:00");

        email.message.date_sent = None;
        assert_eq!(sent_at(&email), "");
    }
}

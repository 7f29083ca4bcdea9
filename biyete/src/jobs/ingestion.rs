use crate::helpers::query_builder::{ParserBinding, QueryBuilder};
use crate::integrations::MailSource;
use anyhow::{Context, Result};
use extractors::ParseContext;
use shared_types::{RawMessage, ThreadBatch, TransactionRecord};
use std::collections::HashSet;

/// Threads fetched per pass unless configured otherwise
pub const DEFAULT_MAX_THREADS: usize = 1;

/// Working unit for one unread message during a pass
#[derive(Debug, Clone)]
pub struct Email {
    /// Labels on the owning thread
    pub labels: Vec<String>,
    pub message: RawMessage,
    pub element: Option<ParserBinding>,
    pub info: Option<TransactionRecord>,
    pub thread_id: String,
    read_marked: bool,
}

impl Email {
    pub fn new(thread: &ThreadBatch, message: RawMessage) -> Self {
        Self {
            labels: thread.labels.clone(),
            message,
            element: None,
            info: None,
            thread_id: thread.thread_id.clone(),
            read_marked: false,
        }
    }

    pub fn is_read_marked(&self) -> bool {
        self.read_marked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No parser bound to any of the thread's labels
    Skipped,
    Accepted,
    /// A parser ran but produced nothing usable
    Rejected,
}

#[derive(Debug, Default)]
pub struct IngestionReport {
    pub threads: usize,
    pub messages: usize,
    pub skipped: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Accepted emails in fetch order
    pub emails: Vec<Email>,
}

/// Runs one ingestion pass: fetch, route, extract, aggregate.
///
/// Every message that reaches a parser is marked read once, whatever the
/// outcome. Messages without a bound label are left untouched.
pub struct IngestionEngine<'a> {
    router: &'a QueryBuilder,
    source: &'a mut dyn MailSource,
    context: ParseContext,
    start: usize,
    max: usize,
}

impl<'a> IngestionEngine<'a> {
    pub fn new(
        router: &'a QueryBuilder,
        source: &'a mut dyn MailSource,
        context: ParseContext,
    ) -> Self {
        Self {
            router,
            source,
            context,
            start: 0,
            max: DEFAULT_MAX_THREADS,
        }
    }

    pub fn with_window(mut self, start: usize, max: usize) -> Self {
        self.start = start;
        self.max = max;
        self
    }

    pub fn run(&mut self) -> Result<IngestionReport> {
        let query = self.router.query();
        tracing::info!(query = %query.combined, start = self.start, max = self.max, "Starting ingestion pass");

        let threads = self
            .source
            .search(query, self.start, self.max)
            .context("Failed to fetch candidate threads")?;

        let mut report = IngestionReport {
            threads: threads.len(),
            ..Default::default()
        };
        let mut seen = HashSet::new();

        for thread in &threads {
            for message in thread.messages.iter().filter(|m| m.is_unread) {
                if !seen.insert(message.id.clone()) {
                    tracing::debug!(id = %message.id, "Already processed in this pass");
                    continue;
                }

                report.messages += 1;
                let mut email = Email::new(thread, message.clone());

                match self.process(&mut email) {
                    Outcome::Skipped => report.skipped += 1,
                    Outcome::Rejected => report.rejected += 1,
                    Outcome::Accepted => {
                        report.accepted += 1;
                        report.emails.push(email);
                    }
                }
            }
        }

        tracing::info!(
            "Ingestion pass done: {} threads, {} messages, {} accepted, {} rejected, {} skipped",
            report.threads,
            report.messages,
            report.accepted,
            report.rejected,
            report.skipped
        );

        Ok(report)
    }

    /// Route and extract a single email.
    pub fn process(&mut self, email: &mut Email) -> Outcome {
        let router = self.router;

        let Some(binding) = router.lookup_by_label_set(email.labels.as_slice()) else {
            tracing::debug!(id = %email.message.id, labels = ?email.labels, "No parser for labels");
            return Outcome::Skipped;
        };
        email.element = Some(binding.clone());

        let parser = &binding.parser;
        let context = self.context.restamped();
        let outcome = match parser.parse(&email.message, &context) {
            Ok(record) if record.is_usable() => {
                tracing::info!(
                    id = %email.message.id,
                    parser = %parser.identity().name,
                    amount = %record.currency.format(record.amount),
                    "Accepted email"
                );
                email.info = Some(record);
                Outcome::Accepted
            }
            Ok(_) => {
                tracing::warn!(id = %email.message.id, parser = %parser.identity().name, "Nothing extracted, rejecting email");
                Outcome::Rejected
            }
            Err(e) => {
                tracing::warn!(id = %email.message.id, parser = %parser.identity().name, "Could not parse email: {}", e);
                Outcome::Rejected
            }
        };

        self.mark_read(email);
        outcome
    }

    /// Mark the email read in the source. Calling it again is a no-op.
    pub fn mark_read(&mut self, email: &mut Email) {
        if email.read_marked {
            tracing::debug!(id = %email.message.id, "Email already marked read");
            return;
        }

        match self.source.mark_read(&email.message) {
            Ok(()) => email.read_marked = true,
            Err(e) => tracing::warn!(id = %email.message.id, "Failed to mark email read: {:#}", e),
        }
    }
}

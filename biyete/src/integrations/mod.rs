pub mod imap_client;
pub mod json_mailbox;

use crate::helpers::query_builder::SearchQuery;
use anyhow::Result;
use shared_types::{RawMessage, ThreadBatch};

pub use imap_client::ImapMailSource;
pub use json_mailbox::JsonMailbox;

/// Where candidate messages come from and where their read state lives.
pub trait MailSource {
    /// Fetch threads matching `query`, skipping `start` and returning at most `max`.
    fn search(&mut self, query: &SearchQuery, start: usize, max: usize)
        -> Result<Vec<ThreadBatch>>;

    fn mark_read(&mut self, message: &RawMessage) -> Result<()>;
}

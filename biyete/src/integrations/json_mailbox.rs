use super::MailSource;
use crate::helpers::query_builder::SearchQuery;
use anyhow::{Context, Result};
use shared_types::{RawMessage, ThreadBatch};
use std::fs;
use std::path::{Path, PathBuf};

/// Mail source backed by a JSON file holding an array of threads.
///
/// Used for offline runs and fixtures. Read flags are kept in memory until
/// [`JsonMailbox::save`] writes them back.
#[derive(Debug, Default)]
pub struct JsonMailbox {
    path: Option<PathBuf>,
    threads: Vec<ThreadBatch>,
    marked: Vec<String>,
}

impl JsonMailbox {
    pub fn open(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read mailbox {}", path.display()))?;
        let threads: Vec<ThreadBatch> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse mailbox {}", path.display()))?;

        tracing::info!("Loaded {} threads from {}", threads.len(), path.display());

        Ok(Self {
            path: Some(path.to_path_buf()),
            threads,
            marked: Vec::new(),
        })
    }

    pub fn from_threads(threads: Vec<ThreadBatch>) -> Self {
        Self {
            path: None,
            threads,
            marked: Vec::new(),
        }
    }

    /// Write threads back to the file they were loaded from
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.threads)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write mailbox {}", path.display()))?;
        Ok(())
    }

    pub fn threads(&self) -> &[ThreadBatch] {
        &self.threads
    }

    /// Ids passed to `mark_read`, in call order
    pub fn marked(&self) -> &[String] {
        &self.marked
    }

    fn matches(thread: &ThreadBatch, query: &SearchQuery) -> bool {
        thread.has_unread() && thread.labels.iter().any(|label| query.matches_label(label))
    }
}

impl MailSource for JsonMailbox {
    fn search(
        &mut self,
        query: &SearchQuery,
        start: usize,
        max: usize,
    ) -> Result<Vec<ThreadBatch>> {
        tracing::debug!(query = %query.combined, start, max, "Searching JSON mailbox");

        Ok(self
            .threads
            .iter()
            .filter(|thread| Self::matches(thread, query))
            .skip(start)
            .take(max)
            .cloned()
            .collect())
    }

    fn mark_read(&mut self, message: &RawMessage) -> Result<()> {
        let stored = self
            .threads
            .iter_mut()
            .flat_map(|thread| thread.messages.iter_mut())
            .find(|stored| stored.id == message.id)
            .with_context(|| format!("Message {} not found in mailbox", message.id))?;

        stored.is_unread = false;
        self.marked.push(message.id.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::query_builder::QueryBuilder;
    use extractors::registry;

    fn message(id: &str, unread: bool) -> RawMessage {
        RawMessage {
            id: id.to_string(),
            thread_id: format!("t-{}", id),
            subject: None,
            from_address: "notificaciones@bancoestado.cl".to_string(),
            date_sent: None,
            body_text: String::new(),
            is_unread: unread,
            folder: None,
            uid: None,
        }
    }

    fn thread(id: &str, label: &str, unread: bool) -> ThreadBatch {
        ThreadBatch {
            thread_id: format!("t-{}", id),
            labels: vec![label.to_string()],
            messages: vec![message(id, unread)],
        }
    }

    fn query() -> SearchQuery {
        QueryBuilder::new(&[registry::banco_estado()])
            .unwrap()
            .query()
            .clone()
    }

    #[test]
    fn test_search_filters_unread_and_label() {
        let mut mailbox = JsonMailbox::from_threads(vec![
            thread("1", "biyete/expense:cl-bancoestado:purchase-notifications", true),
            thread("2", "INBOX", true),
            thread("3", "biyete-deposit:cl-bancoestado:donation-notifications", false),
            thread("4", "Deposit:CL-BancoEstado:Transfer-Notifications", true),
        ]);

        let threads = mailbox.search(&query(), 0, 10).unwrap();
        let ids: Vec<&str> = threads.iter().map(|t| t.thread_id.as_str()).collect();
        assert_eq!(ids, vec!["t-1", "t-4"]);
    }

    #[test]
    fn test_search_pages_over_matches() {
        let label = "biyete/expense:cl-bancoestado:purchase-notifications";
        let mut mailbox = JsonMailbox::from_threads(vec![
            thread("1", label, true),
            thread("2", label, true),
            thread("3", label, true),
        ]);

        let threads = mailbox.search(&query(), 1, 1).unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].thread_id, "t-2");
    }

    #[test]
    fn test_mark_read_updates_message() {
        let label = "biyete/expense:cl-bancoestado:purchase-notifications";
        let mut mailbox = JsonMailbox::from_threads(vec![thread("1", label, true)]);

        mailbox.mark_read(&message("1", true)).unwrap();

        assert!(!mailbox.threads()[0].messages[0].is_unread);
        assert_eq!(mailbox.marked(), ["1".to_string()]);
        assert!(mailbox.search(&query(), 0, 10).unwrap().is_empty());
        assert!(mailbox.mark_read(&message("404", true)).is_err());
    }

    #[test]
    fn test_open_and_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mailbox.json");
        let label = "biyete/expense:cl-bancoestado:purchase-notifications";

        JsonMailbox::from_threads(vec![thread("1", label, true)])
            .save_to(&path)
            .unwrap();

        let mut mailbox = JsonMailbox::open(&path).unwrap();
        mailbox.mark_read(&message("1", true)).unwrap();
        mailbox.save().unwrap();

        let reloaded = JsonMailbox::open(&path).unwrap();
        assert!(!reloaded.threads()[0].messages[0].is_unread);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonMailbox::open(&dir.path().join("missing.json")).is_err());
    }
}

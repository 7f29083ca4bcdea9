use super::{accepted, now_millis, sent_at, Action, DAY_FORMAT, HOUR_FORMAT};
use crate::jobs::ingestion::Email;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde_json::json;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub const HEADERS: [&str; 16] = [
    "id",
    "email",
    "amount",
    "currency",
    "context",
    "account",
    "day",
    "hour",
    "type",
    "label",
    "entity",
    "comment",
    "created at",
    "sent at",
    "json",
    "ts",
];

/// Appends one spreadsheet style row per accepted email to a CSV file.
pub struct CsvSheetAction {
    path: PathBuf,
}

impl CsvSheetAction {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row(email: &Email, ts: i64) -> Result<Vec<String>> {
        let (binding, info) = accepted(email)?;
        let message = &email.message;
        let date = &info.date.formatter;
        let sent = sent_at(email);

        let json = json!({
            "id": message.id,
            "label": binding.label.raw,
            "info": info,
            "date": sent,
            "ts": ts,
        });

        Ok(vec![
            message.id.clone(),
            message.from_address.clone(),
            info.amount.to_string(),
            info.currency.code.clone(),
            info.context.clone(),
            info.account.clone(),
            date.format(DAY_FORMAT),
            date.format(HOUR_FORMAT),
            info.kind.to_string(),
            binding.label.raw.clone(),
            info.entity.clone(),
            info.comment.clone(),
            info.created_at.to_string(),
            sent,
            serde_json::to_string(&json)?,
            ts.to_string(),
        ])
    }
}

impl Action for CsvSheetAction {
    fn name(&self) -> &str {
        "csv-sheet"
    }

    fn run(&mut self, email: &Email) -> Result<()> {
        let row = Self::row(email, now_millis())?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let needs_headers = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_headers {
            writer.write_record(HEADERS)?;
        }
        writer.write_record(&row)?;
        writer.flush()?;

        tracing::info!("Saved email {} to {}", email.message.id, self.path.display());
        Ok(())
    }
}

use super::{accepted, now_millis, sent_at, Action, DAY_FORMAT, HOUR_FORMAT};
use crate::jobs::ingestion::Email;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Writes the notification payload of every accepted email as one JSON line.
pub struct JsonPayloadAction {
    target: String,
    writer: Box<dyn Write>,
}

impl JsonPayloadAction {
    pub fn stdout() -> Self {
        Self {
            target: "stdout".to_string(),
            writer: Box::new(io::stdout()),
        }
    }

    pub fn to_file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        Ok(Self {
            target: path.display().to_string(),
            writer: Box::new(file),
        })
    }

    pub fn payload(email: &Email, ts: i64) -> Result<Value> {
        let (binding, info) = accepted(email)?;
        let date = &info.date.formatter;

        Ok(json!({
            "id": email.message.id,
            "label": binding.label.raw,
            "info": info,
            "date": {
                "formatted": date.format(DAY_FORMAT),
                "time": date.format(HOUR_FORMAT),
                "message": sent_at(email),
            },
            "ts": ts,
        }))
    }
}

impl Action for JsonPayloadAction {
    fn name(&self) -> &str {
        "json-payload"
    }

    fn run(&mut self, email: &Email) -> Result<()> {
        let payload = Self::payload(email, now_millis())?;

        serde_json::to_writer(&mut self.writer, &payload)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        tracing::debug!("Sent email {} to {}", email.message.id, self.target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::accepted_email;
    use extractors::banco_estado::labels;

    #[test]
    fn test_payload_shape() {
        let payload = JsonPayloadAction::payload(&accepted_email(), 7).unwrap();

        assert_eq!(payload["id"], "msg-1");
        assert_eq!(payload["label"], labels::PURCHASE);
        assert_eq!(payload["date"]["formatted"], "2020-06-27");
        assert_eq!(payload["date"]["time"], "13:08");
        assert_eq!(payload["date"]["message"], "2020-06-27T15:08:00+00:00");
        assert_eq!(payload["ts"], 7);
        assert_eq!(payload["info"]["context"], "ACME");
        assert_eq!(payload["info"]["date"]["raw"], "27/06/2020 13:08");
        assert_eq!(payload["info"]["parsed"], true);
    }

    #[test]
    fn test_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payloads.jsonl");

        let mut action = JsonPayloadAction::to_file(&path).unwrap();
        action.run(&accepted_email()).unwrap();
        action.run(&accepted_email()).unwrap();
        drop(action);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["info"]["account"], "1234");
    }
}

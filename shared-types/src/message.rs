use serde::{Deserialize, Serialize};

/// A message as delivered by the mail source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub thread_id: String,

    // Headers
    pub subject: Option<String>,
    pub from_address: String,

    // Sent date in unix milliseconds
    pub date_sent: Option<i64>,

    // Plain text body
    pub body_text: String,

    pub is_unread: bool,

    // Where the message lives in the source, when the source needs it
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub uid: Option<u32>,
}

impl RawMessage {
    pub fn body(&self) -> &str {
        &self.body_text
    }
}

/// One search hit: a thread, its messages and the labels on the thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadBatch {
    pub thread_id: String,
    pub labels: Vec<String>,
    pub messages: Vec<RawMessage>,
}

impl ThreadBatch {
    pub fn has_unread(&self) -> bool {
        self.messages.iter().any(|m| m.is_unread)
    }
}

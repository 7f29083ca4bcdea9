use super::MailSource;
use crate::config::ImapConfig;
use crate::helpers::query_builder::SearchQuery;
use anyhow::{Context, Result};
use imap::ClientBuilder;
use mail_parser::MessageParser;
use shared_types::{RawMessage, ThreadBatch};

/// IMAP mail source.
///
/// Gmail exposes every label as a mailbox named after the label, so each
/// per-label query selects the mailbox for the label's `key` representation
/// and searches it for unseen messages.
pub struct ImapMailSource {
    session: imap::Session<imap::Connection>,
}

impl ImapMailSource {
    pub fn connect(config: &ImapConfig) -> Result<Self> {
        match (&config.access_token, &config.password) {
            (Some(token), _) => {
                Self::connect_with_oauth(&config.host, config.port, &config.username, token)
            }
            (None, Some(password)) => {
                Self::connect_with_password(&config.host, config.port, &config.username, password)
            }
            (None, None) => anyhow::bail!(
                "No IMAP credentials configured for {}, set password or access_token",
                config.username
            ),
        }
    }

    pub fn connect_with_password(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let client = ClientBuilder::new(host, port)
            .connect()
            .context("Failed to connect to IMAP server")?;

        let session = client
            .login(username, password)
            .map_err(|e| anyhow::anyhow!("IMAP login failed: {:?}", e.0))?;

        tracing::info!("Logged in to {}:{} as {}", host, port, username);
        Ok(Self { session })
    }

    pub fn connect_with_oauth(
        host: &str,
        port: u16,
        username: &str,
        access_token: &str,
    ) -> Result<Self> {
        struct GmailOAuth2 {
            user: String,
            access_token: String,
        }

        impl imap::Authenticator for GmailOAuth2 {
            type Response = String;
            fn process(&self, _data: &[u8]) -> Self::Response {
                format!(
                    "user={}\x01auth=Bearer {}\x01\x01",
                    self.user, self.access_token
                )
            }
        }

        let gmail_auth = GmailOAuth2 {
            user: username.to_string(),
            access_token: access_token.to_string(),
        };

        let client = ClientBuilder::new(host, port)
            .connect()
            .context("Failed to connect to IMAP server")?;

        let session = client
            .authenticate("XOAUTH2", &gmail_auth)
            .map_err(|e| anyhow::anyhow!("OAuth2 IMAP auth failed: {:?}", e.0))?;

        tracing::info!("Authenticated to {}:{} as {} with XOAUTH2", host, port, username);
        Ok(Self { session })
    }

    /// Newest unseen UIDs in `mailbox`, after skipping `start` of them.
    fn search_unseen(&mut self, mailbox: &str, start: usize, max: usize) -> Result<Vec<u32>> {
        self.session
            .select(mailbox)
            .with_context(|| format!("Failed to select mailbox {}", mailbox))?;

        let mut uids: Vec<u32> = self.session.uid_search("UNSEEN")?.into_iter().collect();
        uids.sort_unstable_by(|a, b| b.cmp(a));

        tracing::debug!(mailbox, found = uids.len(), "IMAP SEARCH UNSEEN");

        Ok(uids.into_iter().skip(start).take(max).collect())
    }

    fn fetch_message(&mut self, mailbox: &str, uid: u32) -> Result<RawMessage> {
        // PEEK leaves \Seen untouched, marking read is the engine's decision
        let messages = self.session.uid_fetch(uid.to_string(), "(FLAGS BODY.PEEK[])")?;

        let message = messages.iter().next().context("Email not found")?;
        let body = message.body().context("Email has no body")?;

        let parsed = MessageParser::default()
            .parse(body)
            .context("Failed to parse email")?;

        let id = parsed
            .message_id()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{}:{}", mailbox, uid));

        let from_address = parsed
            .from()
            .and_then(|addrs| addrs.first())
            .and_then(|addr| addr.address())
            .map(|a| a.to_string())
            .unwrap_or_default();

        let is_read = message.flags().contains(&imap::types::Flag::Seen);

        Ok(RawMessage {
            thread_id: id.clone(),
            id,
            subject: parsed.subject().map(|s| s.to_string()),
            from_address,
            date_sent: parsed.date().map(|dt| dt.to_timestamp() * 1000),
            body_text: parsed.body_text(0).map(|s| s.to_string()).unwrap_or_default(),
            is_unread: !is_read,
            folder: Some(mailbox.to_string()),
            uid: Some(uid),
        })
    }
}

impl MailSource for ImapMailSource {
    fn search(
        &mut self,
        query: &SearchQuery,
        start: usize,
        max: usize,
    ) -> Result<Vec<ThreadBatch>> {
        tracing::info!("IMAP search for {}", query.combined);
        let mut threads = Vec::new();

        for label_query in &query.per_label {
            let remaining = max.saturating_sub(threads.len());
            if remaining == 0 {
                break;
            }

            let mailbox = label_query.label.key.as_str();
            let uids = match self.search_unseen(mailbox, start, remaining) {
                Ok(uids) => uids,
                Err(e) => {
                    tracing::warn!("Skipping mailbox {}: {:#}", mailbox, e);
                    continue;
                }
            };

            for uid in uids {
                let message = self
                    .fetch_message(mailbox, uid)
                    .with_context(|| format!("Failed to fetch UID {} from {}", uid, mailbox))?;

                threads.push(ThreadBatch {
                    thread_id: message.thread_id.clone(),
                    labels: vec![mailbox.to_string()],
                    messages: vec![message],
                });
            }
        }

        Ok(threads)
    }

    fn mark_read(&mut self, message: &RawMessage) -> Result<()> {
        let (Some(mailbox), Some(uid)) = (&message.folder, message.uid) else {
            anyhow::bail!("Message {} has no IMAP location", message.id);
        };

        self.session.select(mailbox)?;
        self.session
            .uid_store(uid.to_string(), "+FLAGS (\\Seen)")
            .with_context(|| format!("Failed to flag UID {} in {} as seen", uid, mailbox))?;

        Ok(())
    }
}

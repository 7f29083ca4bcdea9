use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use shared_types::DateLocale;
use std::path::{Path, PathBuf};

use crate::jobs::ingestion::DEFAULT_MAX_THREADS;

const DEFAULT_CONFIG: &str = r#"
# Mailbox to read bank notifications from. Gmail exposes labels as
# IMAP mailboxes named biyete/<label>.
# [imap]
# host = "imap.gmail.com"
# port = 993
# username = "you@gmail.com"
# password = "app-password"
# access_token = "oauth2-access-token"

[run]
max_threads = 1
start = 0
locale = "es"

[output]
# csv_path = "/path/to/transactions.csv"
# json_path = "/path/to/payloads.jsonl"
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BiyeteConfig {
    pub imap: Option<ImapConfig>,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImapConfig {
    #[serde(default = "default_imap_host")]
    pub host: String,
    #[serde(default = "default_imap_port")]
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    /// XOAUTH2 access token, preferred over the password when both are set
    pub access_token: Option<String>,
}

fn default_imap_host() -> String {
    "imap.gmail.com".to_string()
}

fn default_imap_port() -> u16 {
    993
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RunConfig {
    pub max_threads: usize,
    pub start: usize,
    pub locale: DateLocale,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_threads: DEFAULT_MAX_THREADS,
            start: 0,
            locale: DateLocale::Es,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct OutputConfig {
    pub csv_path: Option<PathBuf>,
    /// JSON lines file for payloads, stdout when unset
    pub json_path: Option<PathBuf>,
}

impl BiyeteConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        Self::load_from(&get_config_path())
    }

    /// Load `config_path`, writing the default file first if it does not exist.
    pub fn load_from(config_path: &Path) -> Result<(Self, PathBuf), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
            tracing::info!("Wrote default config to {}", config_path.display());
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .build()?;

        let config: BiyeteConfig = builder.try_deserialize()?;

        Ok((config, config_path.to_path_buf()))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("biyete").join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_is_written_and_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let (config, loaded_from) = BiyeteConfig::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(loaded_from, path);
        assert!(config.imap.is_none());
        assert_eq!(config.run.max_threads, 1);
        assert_eq!(config.run.start, 0);
        assert_eq!(config.run.locale, DateLocale::Es);
        assert!(config.output.csv_path.is_none());
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[imap]
username = "someone@gmail.com"
access_token = "token"

[run]
max_threads = 25
locale = "en"

[output]
csv_path = "/tmp/transactions.csv"
"#,
        )
        .unwrap();

        let (config, _) = BiyeteConfig::load_from(&path).unwrap();

        let imap = config.imap.unwrap();
        assert_eq!(imap.host, "imap.gmail.com");
        assert_eq!(imap.port, 993);
        assert_eq!(imap.username, "someone@gmail.com");
        assert_eq!(imap.access_token.as_deref(), Some("token"));
        assert!(imap.password.is_none());
        assert_eq!(config.run.max_threads, 25);
        assert_eq!(config.run.start, 0);
        assert_eq!(config.run.locale, DateLocale::En);
        assert_eq!(
            config.output.csv_path,
            Some(PathBuf::from("/tmp/transactions.csv"))
        );
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[run]\nmax_threads = \"many\"\n").unwrap();

        assert!(BiyeteConfig::load_from(&path).is_err());
    }
}

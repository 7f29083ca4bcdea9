use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use serde_json::json;
use shared_types::RawMessage;
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;

use biyete::actions::{self, Action, CsvSheetAction, JsonPayloadAction};
use biyete::config::{BiyeteConfig, OutputConfig};
use biyete::integrations::{ImapMailSource, JsonMailbox, MailSource};
use biyete::{Email, IngestionEngine, QueryBuilder};
use extractors::{default_countries, Entity, ParseContext};

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract transactions from bank notification emails", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    log_file_path: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch unread notifications, extract transactions and run actions
    Run {
        /// Read threads from a JSON file instead of IMAP
        #[arg(long, value_name = "PATH")]
        mailbox_json: Option<PathBuf>,

        /// Override the number of threads fetched per pass
        #[arg(long)]
        max_threads: Option<usize>,
    },
    /// Print every label representation and the search predicates
    Labels,
    /// Run a single message through the parser bound to a label
    #[command(group(
        ArgGroup::new("input")
            .required(true)
            .args(["eml_path", "email_body"]),
    ))]
    Parse {
        #[arg(long)]
        label: String,

        /// Path to a .eml file
        #[arg(long, value_name = "PATH", group = "input")]
        eml_path: Option<PathBuf>,

        /// Raw email body text
        #[arg(long, group = "input")]
        email_body: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file_path.as_deref());

    match cli.command {
        Command::Run {
            mailbox_json,
            max_threads,
        } => {
            let (config, config_path) = load_config(cli.config.as_deref())?;
            tracing::info!("Using config at {}", config_path.display());
            run(&config, mailbox_json.as_deref(), max_threads)
        }
        Command::Labels => labels(),
        Command::Parse {
            label,
            eml_path,
            email_body,
        } => {
            let (config, _) = load_config(cli.config.as_deref())?;
            let message = match (eml_path, email_body) {
                (Some(path), None) => load_email_from_eml(&path)?,
                (None, Some(body)) => message_from_body(body),
                _ => unreachable!("clap enforces exactly one input"),
            };
            parse(&label, &message, ParseContext::new(config.run.locale))
        }
    }
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("biyete.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<(BiyeteConfig, PathBuf)> {
    let loaded = match path {
        Some(path) => BiyeteConfig::load_from(path),
        None => BiyeteConfig::load(),
    };
    loaded.context("Failed to load biyete config")
}

fn run(config: &BiyeteConfig, mailbox_json: Option<&Path>, max_threads: Option<usize>) -> Result<()> {
    let max = max_threads.unwrap_or(config.run.max_threads);
    let context = ParseContext::new(config.run.locale);
    let mut actions = build_actions(&config.output)?;

    let emails = match mailbox_json {
        Some(path) => {
            let mut mailbox = JsonMailbox::open(path)?;
            let emails = ingest(&mut mailbox, context, config.run.start, max)?;
            mailbox.save()?;
            emails
        }
        None => {
            let imap = config
                .imap
                .as_ref()
                .context("No [imap] section configured, pass --mailbox-json or add one")?;
            let mut source = ImapMailSource::connect(imap)?;
            ingest(&mut source, context, config.run.start, max)?
        }
    };

    let failures = actions::run_actions(&mut actions, &emails);
    tracing::info!(
        "Delivered {} transactions with {} action failures",
        emails.len(),
        failures
    );

    Ok(())
}

/// One ingestion pass per country
fn ingest(
    source: &mut dyn MailSource,
    context: ParseContext,
    start: usize,
    max: usize,
) -> Result<Vec<Email>> {
    let mut emails = Vec::new();

    for country in default_countries() {
        if country.entities.is_empty() {
            tracing::debug!("No entities registered for {}", country.name);
            continue;
        }

        let router = QueryBuilder::new(&country.entities)
            .with_context(|| format!("Invalid parser registry for {}", country.name))?;

        tracing::info!("Processing emails for {}", country.name);
        let report = IngestionEngine::new(&router, &mut *source, context)
            .with_window(start, max)
            .run()?;

        emails.extend(report.emails);
    }

    Ok(emails)
}

fn build_actions(output: &OutputConfig) -> Result<Vec<Box<dyn Action>>> {
    let mut actions: Vec<Box<dyn Action>> = Vec::new();

    if let Some(path) = &output.csv_path {
        actions.push(Box::new(CsvSheetAction::new(path)));
    }

    match &output.json_path {
        Some(path) => actions.push(Box::new(JsonPayloadAction::to_file(path)?)),
        None => actions.push(Box::new(JsonPayloadAction::stdout())),
    }

    Ok(actions)
}

fn labels() -> Result<()> {
    let mut countries = Vec::new();

    for country in default_countries() {
        let router = QueryBuilder::new(&country.entities)
            .with_context(|| format!("Invalid parser registry for {}", country.name))?;

        countries.push(json!({
            "country": country.id,
            "name": country.name,
            "router": router.summary(),
        }));
    }

    println!("{}", serde_json::to_string_pretty(&countries)?);
    Ok(())
}

fn parse(label: &str, message: &RawMessage, context: ParseContext) -> Result<()> {
    let entities: Vec<Entity> = default_countries()
        .into_iter()
        .flat_map(|country| country.entities)
        .collect();
    let router = QueryBuilder::new(&entities)?;

    let parser = router.resolve_parser_for_label_set(&[label])?;
    tracing::info!("Parsing with {}", parser.identity().name);

    let record = parser
        .parse(message, &context)
        .with_context(|| format!("{} could not parse the message", parser.identity().name))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn message_from_body(body: String) -> RawMessage {
    RawMessage {
        id: "cli".to_string(),
        thread_id: "cli".to_string(),
        subject: None,
        from_address: String::new(),
        date_sent: None,
        body_text: body,
        is_unread: true,
        folder: None,
        uid: None,
    }
}

fn load_email_from_eml(path: &Path) -> Result<RawMessage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read .eml file at {:?}", path))?;
    let parser = mail_parser::MessageParser::default();
    let parsed = parser
        .parse(&bytes)
        .ok_or_else(|| anyhow::anyhow!("Failed to parse .eml file"))?;

    Ok(RawMessage {
        id: parsed
            .message_id()
            .map(|s| s.to_string())
            .unwrap_or_else(|| path.display().to_string()),
        thread_id: path.display().to_string(),
        subject: parsed.subject().map(|s| s.to_string()),
        from_address: parsed
            .from()
            .and_then(|addrs| addrs.first())
            .and_then(|addr| addr.address())
            .map(|a| a.to_string())
            .unwrap_or_default(),
        date_sent: parsed.date().map(|dt| dt.to_timestamp() * 1000),
        body_text: parsed
            .body_text(0)
            .map(|s| s.to_string())
            .unwrap_or_default(),
        is_unread: true,
        folder: None,
        uid: None,
    })
}

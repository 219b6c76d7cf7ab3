//! source-gmail - Gmail source connector launcher
//!
//! Usage:
//!   source-gmail spec
//!   source-gmail check --config <path>
//!   source-gmail discover --config <path>
//!   source-gmail read --config <path> --catalog <path> [--state <path>]
//!
//! Protocol messages go to stdout, one JSON object per line. Logs go to
//! stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gmail_source::protocol::{ConfiguredCatalog, ConnectionStatus, ProtocolMessage, ReadState};
use gmail_source::{GmailClient, GmailSource, SourceConfig, SourceError};
use log::{error, info};
use serde_json::Value;
use std::io::{BufWriter, Stdout, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "source-gmail")]
#[command(about = "Extract Gmail messages and labels as pipeline protocol messages")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the connection specification
    Spec,
    /// Validate the config and probe the mailbox
    Check {
        /// Path to the connector config JSON
        #[arg(long)]
        config: PathBuf,
    },
    /// List the streams this source can produce
    Discover {
        #[arg(long)]
        config: PathBuf,
    },
    /// Read the configured streams
    Read {
        #[arg(long)]
        config: PathBuf,
        /// Path to the configured catalog JSON
        #[arg(long)]
        catalog: PathBuf,
        /// Path to the state persisted by a previous read
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    let mut out = Output::new();

    if let Err(e) = run(args.command, &mut out) {
        error!("{:#}", e);
        let trace = match e.downcast_ref::<SourceError>() {
            Some(source_error) => ProtocolMessage::error_trace(source_error),
            None => ProtocolMessage::error_trace(&SourceError::system(
                e.to_string(),
                format!("{:#}", e),
            )),
        };
        out.emit(&trace).ok();
        std::process::exit(1);
    }
}

fn run(command: Command, out: &mut Output) -> Result<()> {
    match command {
        Command::Spec => out.emit(&ProtocolMessage::Spec {
            spec: GmailSource::spec(),
        }),
        Command::Check { config } => out.emit(&ProtocolMessage::ConnectionStatus {
            connection_status: check_config_file(&config),
        }),
        Command::Discover { config } => {
            SourceConfig::from_file(&config)?;
            out.emit(&ProtocolMessage::Catalog {
                catalog: GmailSource::discover(),
            })
        }
        Command::Read {
            config,
            catalog,
            state,
        } => {
            let config = SourceConfig::from_file(&config)?;
            let catalog: ConfiguredCatalog = source_config::load_json_file(&catalog)?;
            let state: Option<Value> = source_config::load_optional_json_file(state.as_deref())?;
            let state = state.map(ReadState::from_value).unwrap_or_default();

            info!("Starting read of {} stream(s)", catalog.streams.len());
            let client = GmailClient::from_config(&config);
            GmailSource::read(&client, &config, &catalog, &state, |message| {
                out.emit(&message)
            })
        }
    }
}

/// Check never errors; an unreadable config file is a failed status
fn check_config_file(path: &std::path::Path) -> ConnectionStatus {
    match source_config::load_json_file::<Value>(path) {
        Ok(config) => GmailSource::check(config),
        Err(e) => ConnectionStatus::failed(format!("Failed to connect: {:#}", e)),
    }
}

/// Line-oriented protocol writer; flushes after every message so the host
/// sees each record before the next fetch starts
struct Output {
    writer: BufWriter<Stdout>,
}

impl Output {
    fn new() -> Self {
        Self {
            writer: BufWriter::new(std::io::stdout()),
        }
    }

    fn emit(&mut self, message: &ProtocolMessage) -> Result<()> {
        let line = message.to_json_line()?;
        writeln!(self.writer, "{}", line).context("Failed to write to stdout")?;
        self.writer.flush().context("Failed to flush stdout")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmail_source::protocol::Status;

    #[test]
    fn test_parse_spec() {
        let args = Args::try_parse_from(["source-gmail", "spec"]).unwrap();
        assert!(matches!(args.command, Command::Spec));
    }

    #[test]
    fn test_parse_read() {
        let args = Args::try_parse_from([
            "source-gmail",
            "read",
            "--config",
            "config.json",
            "--catalog",
            "catalog.json",
            "--state",
            "state.json",
        ])
        .unwrap();

        match args.command {
            Command::Read {
                config,
                catalog,
                state,
            } => {
                assert_eq!(config, PathBuf::from("config.json"));
                assert_eq!(catalog, PathBuf::from("catalog.json"));
                assert_eq!(state, Some(PathBuf::from("state.json")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_read_without_state() {
        let args = Args::try_parse_from([
            "source-gmail",
            "read",
            "--catalog",
            "catalog.json",
            "--config",
            "config.json",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Read { state: None, .. }));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Args::try_parse_from(["source-gmail"]).is_err());
        assert!(Args::try_parse_from(["source-gmail", "check"]).is_err());
        assert!(Args::try_parse_from(["source-gmail", "read", "--config", "c.json"]).is_err());
        assert!(Args::try_parse_from(["source-gmail", "check", "--config"]).is_err());
        assert!(Args::try_parse_from(["source-gmail", "sync"]).is_err());
        assert!(Args::try_parse_from(["source-gmail", "spec", "--verbose"]).is_err());
    }

    #[test]
    fn test_check_missing_config_file_is_failed_status() {
        let status = check_config_file(std::path::Path::new("/nonexistent/config.json"));
        assert_eq!(status.status, Status::Failed);
        assert!(status.message.starts_with("Failed to connect:"));
    }

    #[test]
    fn test_check_malformed_config_file_is_failed_status() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let status = check_config_file(file.path());
        assert_eq!(status.status, Status::Failed);
    }
}

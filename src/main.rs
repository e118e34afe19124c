//! signwatch CLI entry point.
//!
//! Provides `run`, `parse`, and `check` subcommands for relaying sign lines,
//! classifying a file of lines offline, or validating configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use signwatch::classifier::{Classification, Classifier};
use signwatch::config::Config;
use signwatch::diagnostics::{DiagnosticSink, TracingSink};
use signwatch::logging;
use signwatch::relay::{LineOutcome, RawLine, Relay};

/// signwatch: relays monitoring-bot sign lines to webhook destinations.
#[derive(Parser)]
#[command(name = "signwatch", version, about)]
struct Cli {
    /// Config file. Defaults to `$SIGNWATCH_CONFIG`, then `~/.signwatch/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Read lines and relay them until end of input or Ctrl-C.
    Run {
        /// Read from this file instead of stdin.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Classify every line of a file and print the result.
    Parse {
        /// File with one sign per line.
        file: PathBuf,
    },
    /// Load configuration, build every route, and report problems.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // A missing .env is normal.
    dotenvy::dotenv().ok();

    match cli.command {
        Command::Run { input } => handle_run(cli.config.as_deref(), input.as_deref()).await,
        Command::Parse { file } => handle_parse(&file).await,
        Command::Check => handle_check(cli.config.as_deref()),
    }
}

fn load_config(cli: Option<&Path>) -> anyhow::Result<Config> {
    let path = Config::config_path_with(cli, |key| std::env::var(key).ok())?;
    Config::load(&path).with_context(|| format!("failed to load {}", path.display()))
}

async fn open_input(input: Option<&Path>) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Relay lines until input ends or a shutdown signal arrives.
async fn handle_run(config_path: Option<&Path>, input: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let _logging_guard = logging::init_production(&config.log_settings()?)?;

    let diagnostics: Arc<dyn DiagnosticSink> = Arc::new(TracingSink);
    let relay = Relay::from_config(&config, diagnostics, &|key| std::env::var(key).ok())?;
    for error in relay.config_errors() {
        warn!(error = %error, "route skipped");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let background = relay.dispatcher().start_background(&shutdown_rx);

    let mut lines = open_input(input).await?.lines();
    let mut dispatched: u64 = 0;
    info!("signwatch started");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if let LineOutcome::Dispatched { .. } =
                            relay.handle_line(&RawLine::parse_tagged(&line))
                        {
                            dispatched = dispatched.saturating_add(1);
                        }
                    }
                    Ok(None) => {
                        info!("input closed");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read input");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal, initiating graceful shutdown");
                break;
            }
        }
    }

    // Stop timers first so the final flush is the only sender left.
    shutdown_tx.send(true).ok();
    for handle in background {
        if let Err(e) = handle.await {
            warn!(error = %e, "background task ended abnormally");
        }
    }

    let clean = relay.shutdown().await;
    info!(dispatched, clean, "signwatch shut down");
    Ok(())
}

/// Classify each line of `file` and print its event as JSON.
async fn handle_parse(file: &Path) -> anyhow::Result<()> {
    logging::init_cli("warn");

    let classifier = Classifier::builtin(Arc::new(TracingSink)).context("invalid pattern catalog")?;
    let mut lines = open_input(Some(file)).await?.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match classifier.classify(&line) {
            Classification::Event(event) => {
                println!("{}", serde_json::to_string(&event)?);
            }
            Classification::Unknown(unknown) => {
                println!("Couldn't parse line: {}", unknown.raw);
            }
        }
    }
    Ok(())
}

/// Build every configured route and report what would be skipped.
fn handle_check(config_path: Option<&Path>) -> anyhow::Result<()> {
    logging::init_cli("info");

    let config = load_config(config_path)?;
    let relay = Relay::from_config(&config, Arc::new(TracingSink), &|key| {
        std::env::var(key).ok()
    })?;

    let routes = relay.dispatcher().routes();
    for route in routes {
        let destinations: Vec<&str> = route.destinations.iter().map(|d| d.name()).collect();
        println!("{} -> {}", route.filter_name, destinations.join(", "));
    }
    let errors = relay.config_errors();
    for error in errors {
        println!("error: {error}");
    }
    anyhow::ensure!(
        errors.is_empty(),
        "{} configuration problem(s) found",
        errors.len()
    );
    println!("ok: {} route(s)", routes.len());
    Ok(())
}

//! CLI entrypoint for Solace
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod repl;

use anyhow::{Context, Result};
use clap::Parser;
use repl::{ConsultRepl, ReplObserver};
use solace_application::SessionManager;
use solace_domain::Session;
use solace_infrastructure::{
    ApiClient, ConfigLoader, FileConfig, RestEmotionSource, RestMessageHistory,
    RestSessionDirectory, SseReplyStream, StaticCredentials,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "solace", version, about = "Terminal client for the solace consultation service")]
struct Cli {
    /// Path to a config file (overrides discovered configs)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Override the service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Open this session on startup instead of a fresh draft
    #[arg(long)]
    session: Option<i64>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(cli: &Cli) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The guard must outlive main or buffered log lines are dropped
    let _log_guard = init_logging(&cli)?;

    info!("Starting solace");

    let mut config: FileConfig = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    config.validate().context("Invalid configuration")?;

    if !config.repl.color {
        colored::control::set_override(false);
    }

    // === Dependency Injection ===
    let credentials = Arc::new(StaticCredentials::resolve(config.api.token.clone()));
    let client = Arc::new(
        ApiClient::new(&config.api.base_url, config.request_timeout(), credentials)
            .context("Failed to build the API client")?,
    );

    let manager = Arc::new(
        SessionManager::new(
            Arc::new(RestSessionDirectory::new(Arc::clone(&client))),
            Arc::new(RestMessageHistory::new(Arc::clone(&client))),
            Arc::new(SseReplyStream::new(Arc::clone(&client))),
            Arc::new(RestEmotionSource::new(Arc::clone(&client))),
        )
        .with_poll_settings(config.poll_settings())
        .with_observer(Arc::new(ReplObserver)),
    );

    // Optionally resume a known session instead of starting on a draft
    if let Some(id) = cli.session {
        open_listed_session(&manager, id).await?;
    }

    let repl = ConsultRepl::new(Arc::clone(&manager), config.repl.history_file.clone());
    repl.run().await?;

    manager.teardown().await;
    Ok(())
}

/// Look the requested id up in the directory so we get its title; fall
/// back to the draft with a warning when it is not listed.
async fn open_listed_session(manager: &SessionManager, id: i64) -> Result<()> {
    let listing = manager
        .list_sessions(1, 100)
        .await
        .context("Failed to list sessions")?;
    match listing
        .records
        .iter()
        .find(|record| record.id.get() == id)
    {
        Some(record) => {
            manager.switch_to(Session::from_record(record)).await;
            info!("Resumed session {id}");
        }
        None => {
            warn!("Session {id} not found in the directory; starting a draft instead");
        }
    }
    Ok(())
}

//! ITMANO CLI - sign in, browse services and contact the team from a terminal.
//!
//! Every command shares one `SessionManager`, built at startup and hydrated
//! from the stored token before the command runs.

mod commands;
mod ui;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use itmano_core::{ApiClient, Config, SessionManager};

use commands::{Command, Context};
use ui::spawn_header_watcher;

/// Log file prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "itmano.log";

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
/// The returned guard flushes the log file when dropped.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config_result = Config::load();
    let mut config = config_result.as_ref().cloned().unwrap_or_default();

    let log_guard = init_tracing(config.cache_dir().ok().as_deref());
    if let Err(e) = config_result {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, commands::USAGE);
            std::process::exit(2);
        }
    };

    let api_url = config.api_base_url();
    info!(%api_url, "ITMANO CLI starting");

    let api = ApiClient::new(&api_url, config.request_timeout())?;
    let store = config.token_store()?;
    let session = SessionManager::new(Arc::new(api.clone()), store.clone());
    let watcher = spawn_header_watcher(session.subscribe());

    if command != Command::Help {
        session.hydrate().await;
    }

    let result = commands::run(
        command,
        Context {
            config: &mut config,
            api: &api,
            session: &session,
            store: store.as_ref(),
        },
    )
    .await;

    drop(session);
    let _ = watcher.await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        drop(log_guard);
        std::process::exit(1);
    }

    Ok(())
}

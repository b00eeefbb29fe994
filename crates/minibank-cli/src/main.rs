//! MiniBank CLI - a command-line client for the MiniBanking REST API.
//!
//! Each invocation runs one command against the backend. Credentials persist
//! between runs in the configured credential store, and an expired session is
//! refreshed transparently.

mod commands;
mod output;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use minibank_core::{BankingClient, Config, NavigationBridge, Session};

use commands::Command;

/// Log file prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "minibank.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`). When a log
/// directory is given, the same events are appended to a daily rolling file.
fn init_tracing(log_dir: Option<std::path::PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
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

    let mut config = Config::load()?;
    let _log_guard = init_tracing(config.cache_dir().ok().map(|dir| dir.join("logs")));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    if command == Command::Help {
        print!("{}", commands::USAGE);
        return Ok(());
    }

    let base_url = config.base_url();
    info!(base_url = %base_url, "MiniBank CLI starting");

    let session = Session::new(Arc::new(config.credential_store()?));

    let bridge = Arc::new(NavigationBridge::new());
    let redirected = Arc::new(AtomicBool::new(false));
    {
        let redirected = redirected.clone();
        bridge.set_handler(move |target| {
            debug!(route = %target.route, replace = target.replace, "Navigating");
            redirected.store(true, Ordering::SeqCst);
        });
    }

    let client = BankingClient::from_config(&config, session, bridge.clone())?;

    let result = commands::run(command, &client, &mut config).await;

    if redirected.load(Ordering::SeqCst) {
        if let Some(message) = bridge.take_flash_message() {
            eprintln!("{}", message);
        }
        eprintln!("Run `minibank login` to sign in.");
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

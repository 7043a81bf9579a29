// ABOUTME: Entry point for the nodeswap CLI application.
// ABOUTME: Parses arguments, installs logging and signal handling, and dispatches commands.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use nodeswap::clock::{CancelHandle, CancelToken};
use nodeswap::config::{self, Config};
use nodeswap::error::{Error, Result};
use nodeswap::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

/// Exit status after an operator interrupt.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.quiet, cli.json);
    let (handle, cancel) = CancelHandle::new();
    tokio::spawn(cancel_on_signal(handle));

    if let Err(e) = run(cli, mode, cancel).await {
        Output::new(mode).error(&e.to_string());
        let code = match &e {
            Error::Replace(e) if e.is_cancellation() => EXIT_INTERRUPTED,
            _ => 1,
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli, mode: OutputMode, cancel: CancelToken) -> Result<()> {
    let cwd = env::current_dir()?;
    match cli.command {
        Commands::Init { cluster, force } => {
            config::init_config(&cwd, cluster.as_deref(), force)?;
            Output::new(mode).success(&format!("Wrote {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::DeleteInstance(args) => {
            let config = match &cli.config {
                Some(path) => Config::load(path)?,
                None => Config::discover(&cwd)?,
            };
            commands::delete_instance(config, args, Output::new(mode), cancel).await
        }
    }
}

/// Trip the cancel handle on Ctrl-C or SIGTERM.
async fn cancel_on_signal(handle: CancelHandle) {
    wait_for_signal().await;
    tracing::warn!("interrupt received; stopping before the next change");
    handle.cancel();
}

/// Resolve when Ctrl-C arrives. If the handler cannot be installed, never
/// resolve: a broken listener is not an interrupt.
async fn ctrl_c() {
    interrupted_by(tokio::signal::ctrl_c()).await
}

async fn interrupted_by(listener: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = listener.await {
        tracing::warn!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = ctrl_c() => {}
                Some(()) = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::debug!("SIGTERM handler unavailable: {e}");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

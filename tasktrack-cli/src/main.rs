//! # Tasktrack
//!
//! Command-line client for a personal task-tracking API. It keeps the
//! user's tasks, categories and status-change history in sync with the
//! server and remembers the session and history between runs.
//!
//! ## Usage
//!
//! ```bash
//! tasktrack login --email ada@example.com
//! tasktrack dashboard
//! tasktrack complete 7
//! ```

use clap::Parser;
use std::io;
use std::process::ExitCode;
use tasktrack_cli::app::App;
use tasktrack_cli::cli::Cli;
use tasktrack_cli::commands;
use tasktrack_cli::config::Config;
use tasktrack_cli::error::exit_code;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?.with_overrides(cli.api_url, cli.data_dir, cli.timeout_secs);
    tracing::debug!(
        "Tasktrack v{} using {}",
        env!("CARGO_PKG_VERSION"),
        config.api_url
    );

    let app = App::open(config)?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, exiting...");
            ctrl_c.cancel();
        }
    });

    let mut out = io::stdout().lock();
    let mut err = io::stderr();
    commands::run(&app, cli.command, &mut out, &mut err, shutdown).await?;
    Ok(())
}

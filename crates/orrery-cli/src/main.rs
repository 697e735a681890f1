//! Orrery CLI - Transit insight engine
//!
//! Usage:
//!   orrery analyze --chart chart.json --positions now.json   Full insight analysis
//!   orrery patterns --chart chart.json                       Macro-patterns in a chart
//!   orrery dignity --body venus --longitude 45               Essential dignity
//!   orrery windows --chart chart.json --positions now.json   Transit windows

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Analyze {
            chart,
            positions,
            date,
            json,
        } => {
            commands::cmd_analyze(
                cli.config.as_deref(),
                &chart,
                &positions,
                date.as_deref(),
                json,
            )
            .await
        }
        Commands::Patterns { chart } => commands::cmd_patterns(cli.config.as_deref(), &chart),
        Commands::Dignity { body, longitude } => commands::cmd_dignity(&body, longitude),
        Commands::Windows {
            chart,
            positions,
            date,
        } => commands::cmd_windows(cli.config.as_deref(), &chart, &positions, date.as_deref()),
    }
}

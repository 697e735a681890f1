//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Orrery - Transit insights for natal charts
#[derive(Parser)]
#[command(name = "orrery")]
#[command(about = "Astrological transit insight engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.local/share/orrery/config/orrery.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Full insight analysis for a chart on a date
    Analyze {
        /// Birth chart JSON file
        #[arg(short, long)]
        chart: PathBuf,

        /// Transiting positions JSON file
        #[arg(short, long)]
        positions: PathBuf,

        /// Analysis date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect Grand Trine, T-Square and Yod in a chart
    Patterns {
        /// Birth chart JSON file
        #[arg(short, long)]
        chart: PathBuf,
    },

    /// Essential dignity of a body at a longitude
    Dignity {
        /// Body id (sun, moon, mercury, ...)
        #[arg(short, long)]
        body: String,

        /// Ecliptic longitude in degrees
        #[arg(short, long, allow_negative_numbers = true)]
        longitude: f64,
    },

    /// Transit windows for a chart on a date
    Windows {
        /// Birth chart JSON file
        #[arg(short, long)]
        chart: PathBuf,

        /// Transiting positions JSON file
        #[arg(short, long)]
        positions: PathBuf,

        /// Analysis date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
}

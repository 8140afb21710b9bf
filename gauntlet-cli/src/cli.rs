//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured scenarios against both backends
    Run {
        /// Path to configuration file
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Directory the report files are written to
        #[arg(long, value_name = "PATH")]
        results_dir: Option<PathBuf>,

        /// Seed for identity and backend sampling
        #[arg(long, value_name = "N")]
        seed: Option<u64>,

        /// Set the log level (trace, debug, info, warn, error)
        #[arg(long, value_name = "LEVEL")]
        log_level: Option<String>,
    },

    /// Validate a configuration file, including threshold predicates
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config: PathBuf,
    },

    /// Print a sample configuration file
    SampleConfig {
        /// Write to this file instead of stdout
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

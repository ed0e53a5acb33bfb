//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Connector builder CLI
#[derive(Parser, Debug)]
#[command(name = "connector-builder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the builder command named in the config
    Read {
        /// Request config (JSON) carrying `__command` and the manifest
        #[arg(short = 'C', long)]
        config: PathBuf,

        /// Configured catalog (JSON), required by `test_read`
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Manifest file (YAML or JSON), replacing the one in the config
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

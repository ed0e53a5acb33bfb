//! CLI module
//!
//! Command-line interface for the connector builder.
//!
//! # Commands
//!
//! - `read` - Run the command named in a request config and print its message
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{load_catalog, load_config, render_message, Runner};
pub use server::{app, serve, ServerConfig};

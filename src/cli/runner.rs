//! CLI runner - executes commands

use crate::builder::handle_request;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::cli::server::{serve, ServerConfig};
use crate::error::{Error, Result};
use crate::manifest::load_manifest;
use crate::protocol::{ConfiguredCatalog, Message};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Config key the `--manifest` file is injected under
const MANIFEST_KEY: &str = "__injected_declarative_manifest";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Read {
                config,
                catalog,
                manifest,
            } => {
                let message = self
                    .read(config, catalog.as_deref(), manifest.as_deref())
                    .await?;
                println!("{}", render_message(&message, self.cli.format)?);
                Ok(())
            }
            Commands::Serve { port } => serve(ServerConfig { port: *port }).await,
        }
    }

    /// Load the request files and run the command they name
    pub async fn read(
        &self,
        config: &Path,
        catalog: Option<&Path>,
        manifest: Option<&Path>,
    ) -> Result<Message> {
        let mut config = load_config(config)?;

        if let Some(path) = manifest {
            let manifest = load_manifest(path)?;
            let Value::Object(fields) = &mut config else {
                return Err(Error::config("Config must be a JSON object"));
            };
            debug!(path = %path.display(), "Injecting manifest file");
            fields.insert(MANIFEST_KEY.to_string(), manifest);
        }

        let catalog = catalog.map(load_catalog).transpose()?;
        info!(
            catalog = catalog.is_some(),
            "Running connector builder request"
        );
        handle_request(config, catalog).await
    }
}

/// Load a JSON request config
pub fn load_config(path: &Path) -> Result<Value> {
    load_json(path, "config")
}

/// Load a JSON configured catalog
pub fn load_catalog(path: &Path) -> Result<ConfiguredCatalog> {
    load_json(path, "catalog")
}

fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read {what} file '{}': {e}",
                path.display()
            ))
        }
    })?;
    serde_json::from_str(&content)
        .map_err(|e| Error::config(format!("Invalid {what} JSON in '{}': {e}", path.display())))
}

/// Render a protocol message for stdout
pub fn render_message(message: &Message, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(message)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(message)?,
    })
}

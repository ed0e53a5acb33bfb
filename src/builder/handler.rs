//! Command dispatch
//!
//! Each command answers with exactly one protocol message. Domain failures
//! become `TRACE` messages (or error logs inside a [`StreamRead`]); only
//! invocation errors are returned as `Err`.

use super::grouper::MessageGrouper;
use super::limits::{get_limits, TestReadLimits};
use super::types::StreamRead;
use crate::declarative::{ManifestSource, Source};
use crate::error::{Error, Result};
use crate::protocol::{ConfiguredCatalog, Message};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Trace message when resolution fails
pub const RESOLVE_MANIFEST_ERROR: &str = "Error resolving manifest";

/// Trace message when listing fails
pub const LIST_STREAMS_ERROR: &str = "Error listing streams.";

/// Listing failure for streams a manifest source cannot describe
pub const NOT_DECLARATIVE_STREAM: &str =
    "A declarative source should only contain streams of type DeclarativeStream";

/// Listing failure for retrievers without an HTTP requester
pub const NOT_HTTP_RETRIEVER: &str =
    "A declarative stream should only have a retriever of type HttpStream";

/// Config keys, canonical name first
const COMMAND_KEYS: [&str; 2] = ["__command", "command"];
const MANIFEST_KEYS: [&str; 2] = ["__injected_declarative_manifest", "manifest"];

// ============================================================================
// Commands
// ============================================================================

/// A connector-builder command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Return the resolved manifest
    ResolveManifest,
    /// Return each stream's name and URL
    ListStreams,
    /// Run a bounded read and group its messages
    TestRead,
}

impl Command {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveManifest => "resolve_manifest",
            Self::ListStreams => "list_streams",
            Self::TestRead => "test_read",
        }
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "resolve_manifest" => Ok(Self::ResolveManifest),
            "list_streams" => Ok(Self::ListStreams),
            "test_read" => Ok(Self::TestRead),
            other => Err(Error::invalid_command(other)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Request
// ============================================================================

/// A parsed builder invocation
#[derive(Debug, Clone)]
pub struct BuilderRequest {
    /// What to do
    pub command: Command,
    /// The raw manifest
    pub manifest: Value,
    /// The whole request config, as templates see it
    pub config: Value,
    /// Test-read limits
    pub limits: TestReadLimits,
}

impl BuilderRequest {
    /// Parse a request config
    pub fn from_config(config: Value) -> Result<Self> {
        let command: Command = lookup(&config, &COMMAND_KEYS)
            .ok_or_else(|| Error::missing_field(COMMAND_KEYS[0]))?
            .as_str()
            .ok_or_else(|| Error::invalid_value(COMMAND_KEYS[0], "must be a string"))?
            .parse()?;
        let manifest = lookup(&config, &MANIFEST_KEYS)
            .cloned()
            .ok_or_else(|| Error::missing_field(MANIFEST_KEYS[0]))?;
        let limits = get_limits(&config)?;

        Ok(Self {
            command,
            manifest,
            config,
            limits,
        })
    }

    /// Source for this request, bounded by its limits
    pub fn source(&self) -> ManifestSource {
        ManifestSource::new(self.manifest.clone(), self.config.clone()).with_limits(self.limits)
    }
}

fn lookup<'a>(config: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| config.get(key))
        .filter(|v| !v.is_null())
}

// ============================================================================
// Dispatch
// ============================================================================

/// Parse `config` and run the command it names
pub async fn handle_request(config: Value, catalog: Option<ConfiguredCatalog>) -> Result<Message> {
    let request = BuilderRequest::from_config(config)?;
    if request.command == Command::TestRead && catalog.is_none() {
        return Err(Error::missing_field("catalog"));
    }

    let source = request.source();
    handle_connector_builder_request(
        &source,
        request.command,
        &request.config,
        catalog.as_ref(),
        request.limits,
    )
    .await
}

/// Run `command` against `source`
pub async fn handle_connector_builder_request(
    source: &dyn Source,
    command: Command,
    config: &Value,
    catalog: Option<&ConfiguredCatalog>,
    limits: TestReadLimits,
) -> Result<Message> {
    info!(%command, "Handling connector builder request");
    match command {
        Command::ResolveManifest => Ok(resolve_manifest(source)),
        Command::ListStreams => Ok(list_streams(source, config)),
        Command::TestRead => {
            let catalog = catalog.ok_or_else(|| Error::missing_field("catalog"))?;
            read_stream(source, catalog, limits).await
        }
    }
}

/// The resolved manifest, or a trace describing why it could not be built
pub fn resolve_manifest(source: &dyn Source) -> Message {
    match source.resolved_manifest() {
        Ok(manifest) => Message::record(
            Command::ResolveManifest.as_str(),
            json!({ "manifest": manifest }),
        ),
        Err(e) => {
            warn!(error = %e, "Manifest resolution failed");
            Message::trace_from_error(RESOLVE_MANIFEST_ERROR, &e)
        }
    }
}

/// Each stream's name and URL, rendered against `config`
pub fn list_streams(source: &dyn Source, config: &Value) -> Message {
    match stream_urls(source, config) {
        Ok(streams) => Message::record(
            Command::ListStreams.as_str(),
            json!({ "streams": streams }),
        ),
        Err(e) => {
            warn!(error = %e, "Listing streams failed");
            Message::trace_from_error(LIST_STREAMS_ERROR, &e)
        }
    }
}

fn stream_urls(source: &dyn Source, config: &Value) -> Result<Vec<Value>> {
    source
        .streams()?
        .iter()
        .map(|stream| {
            let declarative = stream
                .as_declarative()
                .ok_or_else(|| Error::stream_listing(NOT_DECLARATIVE_STREAM))?;
            let requester = declarative
                .retriever()
                .requester()
                .ok_or_else(|| Error::stream_listing(NOT_HTTP_RETRIEVER))?;

            let mut ctx = requester.context();
            ctx.set_config(config.clone());
            Ok(json!({
                "name": stream.name(),
                "url": requester.url(&ctx, None),
            }))
        })
        .collect()
}

/// Read the catalog's first stream within `limits` and report what happened
pub async fn read_stream(
    source: &dyn Source,
    catalog: &ConfiguredCatalog,
    limits: TestReadLimits,
) -> Result<Message> {
    let stream = catalog
        .first_stream_name()
        .ok_or_else(|| Error::missing_field("catalog.streams"))?
        .to_string();

    let mut grouper = MessageGrouper::new(limits);
    let report = match source.read(catalog, &mut grouper).await {
        Ok(()) => grouper.finish(),
        Err(e) => {
            warn!(stream = %stream, error = %e, "Test read failed");
            StreamRead::from_error(&e)
        }
    };

    info!(
        stream = %stream,
        slices = report.slices.len(),
        limit_reached = report.test_read_limit_reached,
        "Test read finished"
    );
    Ok(Message::record(stream, serde_json::to_value(&report)?))
}

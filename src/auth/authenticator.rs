//! Authenticator implementation

use super::types::{AuthConfig, Location};
use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;

/// Applies credentials to HTTP requests
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// The configuration this authenticator applies
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.config {
            AuthConfig::None => Ok(req),

            AuthConfig::ApiKey {
                location,
                name,
                value,
            } => match location {
                Location::Header => Ok(req.header(name.as_str(), value.as_str())),
                Location::Query => Ok(req.query(&[(name.as_str(), value.as_str())])),
            },

            AuthConfig::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                Ok(req.header(AUTHORIZATION, format!("Basic {encoded}")))
            }

            AuthConfig::Bearer { token } => {
                Ok(req.header(AUTHORIZATION, format!("Bearer {token}")))
            }
        }
    }
}

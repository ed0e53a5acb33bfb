//! Auth configuration types
//!
//! These types represent the runtime auth configuration after template
//! interpolation has been applied.

use serde::{Deserialize, Serialize};

/// Location for API key placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Place in HTTP header
    #[default]
    Header,
    /// Place in query parameter
    Query,
}

/// Authentication configuration (after template interpolation)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// API key placed in a header or query parameter
    ApiKey {
        /// Where to place the key
        location: Location,
        /// Header or parameter name
        name: String,
        /// The key, including any prefix
        value: String,
    },

    /// HTTP Basic authentication
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },
}

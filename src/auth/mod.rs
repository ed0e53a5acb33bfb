//! Authentication module
//!
//! Supports: API Key, Basic, Bearer
//!
//! Credentials are rendered from their templates when the stream is built;
//! the [`Authenticator`] only places them on outgoing requests.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, Location};

//! HTTP module
//!
//! Client, requester and the request/response snapshots that test reads
//! report back.
//!
//! # Features
//!
//! - **Automatic Retries**: 429/5xx and transient network errors, with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Captured Exchanges**: every request is recorded exactly as sent

mod client;
mod exchange;
mod rate_limit;
mod request;
mod requester;

pub use client::{HttpClient, HttpClientConfig};
pub use exchange::{Exchange, RequestSnapshot, ResponseSnapshot, REQUEST_PREFIX, RESPONSE_PREFIX};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use request::{InjectInto, RequestConfig, RequestOption};
pub use requester::{join_url, HttpRequester};

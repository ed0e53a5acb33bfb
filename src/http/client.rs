//! HTTP client with retry and rate limiting
//!
//! Every attempt is captured as an [`Exchange`] so callers can report exactly
//! what was sent and what came back. Non-success statuses are not errors at
//! this level: once retries are exhausted the last exchange is returned and
//! the caller decides what to do with it.

use super::exchange::{Exchange, RequestSnapshot, ResponseSnapshot};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::request::RequestConfig;
use crate::auth::Authenticator;
use crate::error::{Error, Result};
use crate::types::{BackoffType, Method};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            user_agent: format!("connector-builder/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Set max retries
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn with_backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.backoff_type = backoff_type;
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disable rate limiting
    #[must_use]
    pub fn without_rate_limit(mut self) -> Self {
        self.rate_limit = None;
        self
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a client with the given configuration
    pub fn try_new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            authenticator: None,
            rate_limiter,
        })
    }

    /// Set the authenticator
    pub fn set_authenticator(&mut self, authenticator: Authenticator) -> &mut Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Set the retry budget
    pub fn set_max_retries(&mut self, retries: u32) -> &mut Self {
        self.config.max_retries = retries;
        self
    }

    /// Current retry budget
    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Send a request, retrying throttled and failed attempts
    pub async fn send(&self, method: Method, url: &str, request: &RequestConfig) -> Result<Exchange> {
        let max_retries = self.config.max_retries;
        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let mut attempt = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let built = self.build(method, url, request, timeout)?.build()?;
            let snapshot = RequestSnapshot::capture(&built);

            match self.client.execute(built).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if is_retryable_status(status) && attempt < max_retries {
                        let delay = if status == 429 {
                            retry_after(&response)
                                .unwrap_or_else(|| self.calculate_backoff(attempt))
                                .min(self.config.max_backoff)
                        } else {
                            self.calculate_backoff(attempt)
                        };
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {:?}",
                            status,
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let response = ResponseSnapshot::capture(response).await?;
                    debug!("{} {} -> {}", method.as_str(), snapshot.url, response.status);
                    return Ok(Exchange {
                        request: snapshot,
                        response,
                    });
                }
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < max_retries => {
                    let delay = self.calculate_backoff(attempt);
                    warn!(
                        "Request error ({}), attempt {}/{}, retrying in {:?}",
                        e,
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_timeout() => {
                    return Err(Error::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                Err(e) => return Err(Error::Http(e)),
            }
        }
    }

    fn build(
        &self,
        method: Method,
        url: &str,
        request: &RequestConfig,
        timeout: Duration,
    ) -> Result<RequestBuilder> {
        let mut req = self.client.request(method.into(), url).timeout(timeout);

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(ref body) = request.body {
            req = req.json(body);
        } else if !request.form.is_empty() {
            req = req.form(&request.form);
        }

        match self.authenticator {
            Some(ref auth) => auth.apply(req),
            None => Ok(req),
        }
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_authenticator", &self.authenticator.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Check if an HTTP status is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(
        status,
        429 | 500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// Delay requested by a `Retry-After` header, in seconds
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

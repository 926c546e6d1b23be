use super::resilient_http::RetryPolicy;
use crate::snapshot::{FreshnessPolicy, MaxAge};
use chrono::{DateTime, Utc};
use core::time::Duration;

/// Hosting API used when none is configured.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const BATCH_SIZE_ANONYMOUS: usize = 3;
const BATCH_SIZE_AUTHENTICATED: usize = 10;

const REQUEST_DELAY_ANONYMOUS: Duration = Duration::from_millis(1000);
const REQUEST_DELAY_AUTHENTICATED: Duration = Duration::from_millis(100);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a run needs to know, fixed once at startup.
///
/// Batch size and request pacing are derived from whether a token is present; anonymous
/// clients get smaller batches and slower pacing to stay under the hosting service's limits.
#[derive(Debug, Clone)]
pub struct RunConfig {
    token: Option<String>,
    api_url: String,
    prefix: Option<String>,
    force: bool,
    max_age: MaxAge,
    check_docs: bool,
    batch_size: usize,
    request_delay: Duration,
    request_timeout: Duration,
    retry: RetryPolicy,
    now: DateTime<Utc>,
}

impl RunConfig {
    /// Create a configuration with the defaults for the given credential.
    ///
    /// An empty token is treated as no token.
    #[must_use]
    pub fn new(token: Option<String>, now: DateTime<Utc>) -> Self {
        let token = token.filter(|t| !t.is_empty());
        let (batch_size, request_delay) = if token.is_some() {
            (BATCH_SIZE_AUTHENTICATED, REQUEST_DELAY_AUTHENTICATED)
        } else {
            (BATCH_SIZE_ANONYMOUS, REQUEST_DELAY_ANONYMOUS)
        };

        Self {
            token,
            api_url: DEFAULT_API_URL.to_string(),
            prefix: None,
            force: false,
            max_age: MaxAge::default(),
            check_docs: false,
            batch_size,
            request_delay,
            request_timeout: REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            now,
        }
    }

    #[must_use]
    pub fn with_api_url(self, api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_prefix(self, prefix: Option<String>) -> Self {
        Self { prefix, ..self }
    }

    #[must_use]
    pub fn with_force(self, force: bool) -> Self {
        Self { force, ..self }
    }

    #[must_use]
    pub fn with_max_age(self, max_age: MaxAge) -> Self {
        Self { max_age, ..self }
    }

    #[must_use]
    pub fn with_check_docs(self, check_docs: bool) -> Self {
        Self { check_docs, ..self }
    }

    #[must_use]
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            ..self
        }
    }

    #[must_use]
    pub fn with_request_delay(self, request_delay: Duration) -> Self {
        Self { request_delay, ..self }
    }

    #[must_use]
    pub fn with_request_timeout(self, request_timeout: Duration) -> Self {
        Self { request_timeout, ..self }
    }

    #[must_use]
    pub fn with_retry(self, retry: RetryPolicy) -> Self {
        Self { retry, ..self }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    #[must_use]
    pub const fn force(&self) -> bool {
        self.force
    }

    #[must_use]
    pub const fn max_age(&self) -> MaxAge {
        self.max_age
    }

    #[must_use]
    pub const fn check_docs(&self) -> bool {
        self.check_docs
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub const fn request_delay(&self) -> Duration {
        self.request_delay
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub const fn retry(&self) -> RetryPolicy {
        self.retry
    }

    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    #[must_use]
    pub const fn freshness(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(self.force, self.max_age, self.now)
    }
}

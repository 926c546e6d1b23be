//! Resilient HTTP request utilities using retry and timeout middleware.
//!
//! Wraps HTTP operations with [`seatbelt`] retry and timeout middleware so that
//! transient network failures are masked automatically. Each attempt covers both
//! sending the request and reading the full body.

use core::time::Duration;
use layered::{Execute, Service, Stack};
use ohno::app_err;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use seatbelt::retry::{Backoff, Retry};
use seatbelt::timeout::Timeout;
use seatbelt::{RecoveryInfo, ResilienceContext};
use tick::Clock;

const LOG_TARGET: &str = "    client";

/// Maximum retry attempts (on top of the original request).
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between retries.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Delay used for a 429 response that does not say how long to wait.
const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(5);

/// How transient failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retry_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_attempts: MAX_RETRY_ATTEMPTS,
            base_delay: RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retry_attempts: 0,
            base_delay: Duration::ZERO,
        }
    }
}

/// A response whose body has been read in full.
#[derive(Debug)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Parse the `Retry-After` header value as seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    let s = headers.get(reqwest::header::RETRY_AFTER).and_then(|h| h.to_str().ok())?;
    s.parse::<u64>().ok()
}

/// Classify an HTTP outcome for retry purposes.
fn should_retry_response(result: &crate::Result<FetchedResponse>) -> RecoveryInfo {
    match result {
        // Network / connection errors and attempts that timed out are transient.
        Err(_) => RecoveryInfo::retry(),

        Ok(resp) if resp.status.is_server_error() => RecoveryInfo::retry(),

        // Rate-limited (429): honor Retry-After if present, otherwise use a default delay.
        Ok(resp) if resp.status == StatusCode::TOO_MANY_REQUESTS => {
            let delay = parse_retry_after(&resp.headers).map_or(DEFAULT_RATE_LIMIT_DELAY, Duration::from_secs);
            RecoveryInfo::retry().delay(delay)
        }

        // Secondary rate limit (403 with Retry-After): wait the requested duration and retry.
        Ok(resp) if resp.status == StatusCode::FORBIDDEN => parse_retry_after(&resp.headers)
            .map_or_else(RecoveryInfo::never, |delay| RecoveryInfo::retry().delay(Duration::from_secs(delay))),

        // Everything else (success, 4xx client errors) is not retried.
        Ok(_) => RecoveryInfo::never(),
    }
}

/// Send a request and read its body, with automatic retry and a per-attempt timeout.
///
/// When retries are exhausted, the outcome of the last attempt is returned as-is.
pub async fn resilient_request(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    timeout: Duration,
    policy: RetryPolicy,
) -> crate::Result<FetchedResponse> {
    let clock = Clock::new_tokio();
    let context = ResilienceContext::new(&clock).name("http_request");

    let client = client.clone();
    let retry_method = method.clone();
    let service = (
        Retry::layer("retry", &context)
            .clone_input()
            .recovery_with(|result: &crate::Result<FetchedResponse>, _| should_retry_response(result))
            .max_retry_attempts(policy.max_retry_attempts)
            .base_delay(policy.base_delay)
            .backoff(Backoff::Exponential)
            .on_retry(move |_output, args| {
                log::debug!(
                    target: LOG_TARGET,
                    "retrying HTTP {retry_method} (attempt {}, delay {}ms)",
                    args.attempt().index() + 1,
                    args.retry_delay().as_millis(),
                );
            }),
        Timeout::layer("timeout", &context)
            .timeout_error(move |_| app_err!("request timed out after {}ms", timeout.as_millis()))
            .timeout(timeout),
        Execute::new(move |url: String| {
            let client = client.clone();
            let method = method.clone();
            async move {
                let resp = client.request(method, &url).send().await.map_err(ohno::AppError::from)?;
                let status = resp.status();
                let headers = resp.headers().clone();
                let body = resp.text().await.map_err(ohno::AppError::from)?;
                Ok::<_, ohno::AppError>(FetchedResponse { status, headers, body })
            }
        }),
    )
        .into_service();

    service.execute(url.to_string()).await
}

/// Send an HTTP GET request with automatic retry and timeout.
pub async fn resilient_get(client: &reqwest::Client, url: &str, timeout: Duration, policy: RetryPolicy) -> crate::Result<FetchedResponse> {
    resilient_request(client, Method::GET, url, timeout, policy).await
}

/// Send an HTTP HEAD request with a timeout and no retries.
pub async fn head(client: &reqwest::Client, url: &str, timeout: Duration) -> crate::Result<FetchedResponse> {
    resilient_request(client, Method::HEAD, url, timeout, RetryPolicy::none()).await
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn fast_retries(n: u32) -> RetryPolicy {
        RetryPolicy {
            max_retry_attempts: n,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let resp = resilient_get(&client, &format!("{}/flaky", server.uri()), TIMEOUT, fast_retries(3))
            .await
            .unwrap();
        assert_eq!(resp.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_retries_exhausted_returns_last_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let resp = resilient_get(&client, &server.uri(), TIMEOUT, fast_retries(2)).await.unwrap();
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let resp = resilient_get(&client, &server.uri(), TIMEOUT, fast_retries(3)).await.unwrap();
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_forbidden_without_retry_after_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let resp = resilient_get(&client, &server.uri(), TIMEOUT, fast_retries(3)).await.unwrap();
        assert_eq!(resp.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_forbidden_with_retry_after_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let resp = resilient_get(&client, &server.uri(), TIMEOUT, fast_retries(1)).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = resilient_get(&client, &server.uri(), Duration::from_millis(50), RetryPolicy::none())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_timed_out_attempt_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("done"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let resp = resilient_get(&client, &server.uri(), Duration::from_millis(100), fast_retries(1))
            .await
            .unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, "done");
    }

    #[tokio::test]
    async fn test_body_is_read_within_the_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message": "Not Found"}"#))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let resp = resilient_get(&client, &server.uri(), TIMEOUT, RetryPolicy::none()).await.unwrap();
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.body, r#"{"message": "Not Found"}"#);
    }

    #[tokio::test]
    async fn test_head() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/readme"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let resp = head(&client, &format!("{}/readme", server.uri()), TIMEOUT).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
    }
}

//! Hosting API client
//!
//! Minimal client for looking up one repository's metadata. Lookups never fail: every
//! problem is folded into an unverified [`EnrichmentResult`].

use super::repo_spec::RepoSpec;
use super::resilient_http::{self, RetryPolicy};
use crate::snapshot::EnrichmentResult;
use chrono::{DateTime, Utc};
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

const LOG_TARGET: &str = "    client";

const USER_AGENT: &str = concat!("registry-enricher/", env!("CARGO_PKG_VERSION"));

const API_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Timeout for documentation reachability checks.
const DOCS_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Repository fields we care about.
#[derive(Debug, Deserialize)]
struct Repository {
    stargazers_count: Option<u64>,

    #[serde(default)]
    topics: Option<Vec<String>>,

    language: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    description: Option<String>,
}

/// Error payload returned by the API on failure.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Hosting API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Client {
    /// Create a new hosting API client with optional authentication token and base URL
    pub fn new(token: Option<&str>, base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static(API_MEDIA_TYPE));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder().user_agent(USER_AGENT).default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            retry,
        })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up one repository.
    ///
    /// Non-success statuses, malformed bodies, transport errors and timeouts all produce an
    /// unverified result carrying a human-readable error.
    pub async fn fetch(&self, repo: &RepoSpec) -> EnrichmentResult {
        let repo_url = repo.url().as_str();
        let api_url = format!("{}/repos/{}/{}", self.base_url, repo.owner(), repo.repo());

        let resp = match resilient_http::resilient_get(&self.client, &api_url, self.timeout, self.retry).await {
            Ok(r) => r,
            Err(e) => return failure(repo, e.to_string()),
        };

        let rate_limit = extract_rate_limit_from_headers(&resp.headers);
        let status = resp.status;
        let body = resp.body;

        if status == StatusCode::OK {
            return match serde_json::from_str::<Repository>(&body) {
                Ok(data) => {
                    log::debug!(target: LOG_TARGET, "Fetched {repo}: {} stars", data.stargazers_count.unwrap_or(0));
                    EnrichmentResult::verified(
                        repo_url,
                        data.stargazers_count.unwrap_or(0),
                        data.topics.unwrap_or_default(),
                        data.language,
                        data.updated_at,
                        data.description,
                    )
                }
                Err(e) => {
                    log::debug!(target: LOG_TARGET, "Unable to parse response for {repo}: {e}");
                    failure(repo, "Invalid response")
                }
            };
        }

        if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
            && let Some(info) = rate_limit.filter(|info| info.remaining == 0)
        {
            return failure(repo, format!("API rate limit exceeded, resets at {}", info.reset_at.to_rfc3339()));
        }

        let message = serde_json::from_str::<ApiError>(&body).ok().and_then(|e| e.message);
        let message = match (message, status) {
            (Some(m), _) => m,
            (None, StatusCode::NOT_FOUND) => "Repository not found".to_string(),
            (None, status) => format!("HTTP {status}"),
        };

        failure(repo, message)
    }

    /// Whether `url` answers a `HEAD` request with a status below 400.
    pub async fn url_reachable(&self, url: &str) -> bool {
        match resilient_http::head(&self.client, url, DOCS_CHECK_TIMEOUT).await {
            Ok(resp) => resp.status.as_u16() < 400,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Unable to reach {url}: {e}");
                false
            }
        }
    }
}

fn failure(repo: &RepoSpec, error: impl Into<String>) -> EnrichmentResult {
    let error = error.into();
    log::warn!(target: LOG_TARGET, "Lookup failed for {repo}: {error}");
    EnrichmentResult::failed(repo.url().as_str(), error)
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

//! Repository resolution and hosting lookups
//!
//! For each tool, [`RepoResolver`] turns the tool's backend descriptors into ranked
//! [`RepoCandidate`]s on the primary hosting service plus secondary links. The
//! [`BatchScheduler`] then looks up every candidate through the [`Client`], pacing requests
//! and bounding concurrency according to the [`RunConfig`].
//!
//! Lookups never fail the run. A repository that cannot be reached, is missing, or answers
//! with garbage is recorded as an unverified result and the remaining tools carry on.

mod client;
mod progress;
mod repo_resolver;
mod repo_spec;
mod resilient_http;
mod run_config;
mod scheduler;

pub use client::{Client, RateLimitInfo};
pub use progress::{LogProgress, Progress};
pub use repo_resolver::{NamingHeuristic, RepoCandidate, RepoResolver, Resolution, WrapperPredicate};
pub use repo_spec::{PRIMARY_HOST, RepoSpec};
pub use resilient_http::RetryPolicy;
pub use run_config::{DEFAULT_API_URL, RunConfig};
pub use scheduler::BatchScheduler;

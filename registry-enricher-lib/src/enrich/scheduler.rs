use super::client::Client;
use super::progress::Progress;
use super::repo_resolver::{RepoResolver, WrapperPredicate};
use super::run_config::RunConfig;
use crate::registry::{ToolEntry, ToolMap};
use crate::snapshot::{EnrichedTool, EnrichedToolMap, Link, LinkKind};
use chrono::Utc;
use futures_util::future::join_all;

const LOG_TARGET: &str = " scheduler";

/// Enriches tools in fixed-size concurrent batches.
///
/// All tools in a batch run concurrently and the batch is merged into the output before the
/// next batch starts. Within one tool, repository lookups run one after another, each preceded
/// by the configured pacing delay.
#[derive(Debug)]
pub struct BatchScheduler<'a, P> {
    config: &'a RunConfig,
    client: &'a Client,
    resolver: RepoResolver<P>,
}

impl<'a, P: WrapperPredicate> BatchScheduler<'a, P> {
    #[must_use]
    pub const fn new(config: &'a RunConfig, client: &'a Client, resolver: RepoResolver<P>) -> Self {
        Self { config, client, resolver }
    }

    /// Enrich every tool in `tools`.
    pub async fn run(&self, tools: ToolMap, progress: &dyn Progress) -> EnrichedToolMap {
        let entries: Vec<ToolEntry> = tools.into_values().collect();
        let batch_size = self.config.batch_size().max(1);
        let total = entries.len().div_ceil(batch_size);

        log::debug!(target: LOG_TARGET, "Enriching {} tools in {total} batches of up to {batch_size}", entries.len());

        let mut completed = EnrichedToolMap::new();
        for (index, batch) in entries.chunks(batch_size).enumerate() {
            let outcomes = join_all(batch.iter().cloned().map(|tool| self.enrich_tool(tool, progress))).await;
            completed.extend(outcomes.into_iter().map(|tool| (tool.tool.name.clone(), tool)));
            progress.batch_completed(index + 1, total, &completed);
        }

        completed
    }

    async fn enrich_tool(&self, tool: ToolEntry, progress: &dyn Progress) -> EnrichedTool {
        progress.tool_started(&tool.name);

        let resolution = self.resolver.resolve(&tool.backends);

        let mut results = Vec::with_capacity(resolution.candidates.len());
        for candidate in &resolution.candidates {
            tokio::time::sleep(self.config.request_delay()).await;
            results.push(self.client.fetch(&candidate.repo).await);
        }

        let mut links = Vec::new();
        if let Some(selected) = resolution.selected() {
            let url = selected.repo.url().as_str();
            let verified = results.iter().any(|r| r.url == url && r.verified);
            links.push(Link {
                kind: LinkKind::Github,
                url: url.to_string(),
                verified,
            });
        }
        links.extend(resolution.secondary);

        if self.config.check_docs()
            && let Some(primary) = results.iter().find(|r| r.verified)
        {
            let url = format!("{}#readme", primary.url);
            let verified = self.client.url_reachable(&url).await;
            links.push(Link {
                kind: LinkKind::Docs,
                url,
                verified,
            });
        }

        EnrichedTool {
            tool,
            links,
            results,
            last_enhanced: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::enrich::RetryPolicy;
    use core::time::Duration;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingProgress {
        started: Mutex<Vec<String>>,
        batches: Mutex<Vec<(usize, usize, usize)>>,
    }

    impl Progress for RecordingProgress {
        fn tool_started(&self, name: &str) {
            self.started.lock().unwrap().push(name.to_string());
        }

        fn batch_completed(&self, index: usize, total: usize, completed: &EnrichedToolMap) {
            self.batches.lock().unwrap().push((index, total, completed.len()));
        }
    }

    fn tool(name: &str, backends: &[&str]) -> (String, ToolEntry) {
        (
            name.to_string(),
            ToolEntry {
                name: name.to_string(),
                backends: backends.iter().map(ToString::to_string).collect(),
                ..ToolEntry::default()
            },
        )
    }

    fn config(server: &MockServer) -> RunConfig {
        RunConfig::new(None, Utc::now())
            .with_api_url(server.uri())
            .with_batch_size(2)
            .with_request_delay(Duration::ZERO)
            .with_retry(RetryPolicy::none())
    }

    async fn mount_repo(server: &MockServer, owner: &str, repo: &str, status: u16) {
        let body = if status == 200 { r#"{"stargazers_count": 7}"# } else { r#"{"message": "Not Found"}"# };
        Mock::given(method("GET"))
            .and(path(format!("/repos/{owner}/{repo}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_batches_and_results() {
        let server = MockServer::start().await;
        mount_repo(&server, "a", "a", 200).await;
        mount_repo(&server, "b", "b", 200).await;
        mount_repo(&server, "c", "c", 200).await;

        let config = config(&server);
        let client = Client::new(None, config.api_url(), config.request_timeout(), config.retry()).unwrap();
        let scheduler = BatchScheduler::new(&config, &client, RepoResolver::new());

        let tools: ToolMap = [tool("a", &["aqua:a/a"]), tool("b", &["aqua:b/b"]), tool("c", &["aqua:c/c"])].into_iter().collect();
        let progress = RecordingProgress::default();
        let enriched = scheduler.run(tools, &progress).await;

        assert_eq!(enriched.len(), 3);
        assert!(enriched.values().all(|t| t.results.len() == 1 && t.results[0].verified));
        assert!(enriched.values().all(|t| t.last_enhanced.is_some()));
        assert_eq!(*progress.batches.lock().unwrap(), vec![(1, 2, 2), (2, 2, 3)]);
        assert_eq!(progress.started.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let server = MockServer::start().await;
        mount_repo(&server, "good", "tool", 200).await;
        mount_repo(&server, "bad", "tool", 404).await;

        let config = config(&server);
        let client = Client::new(None, config.api_url(), config.request_timeout(), config.retry()).unwrap();
        let scheduler = BatchScheduler::new(&config, &client, RepoResolver::new());

        let tools: ToolMap = [tool("bad", &["aqua:bad/tool"]), tool("good", &["aqua:good/tool"])].into_iter().collect();
        let enriched = scheduler.run(tools, &RecordingProgress::default()).await;

        let bad = &enriched["bad"];
        assert!(!bad.results[0].verified);
        assert_eq!(bad.results[0].error.as_deref(), Some("Not Found"));
        assert_eq!(bad.links.len(), 1);
        assert!(!bad.links[0].verified);

        let good = &enriched["good"];
        assert!(good.results[0].verified);
        assert!(good.links[0].verified);
    }

    #[tokio::test]
    async fn test_every_candidate_is_looked_up_in_order() {
        let server = MockServer::start().await;
        mount_repo(&server, "someone", "asdf-tool", 200).await;
        mount_repo(&server, "owner", "tool", 404).await;

        let config = config(&server);
        let client = Client::new(None, config.api_url(), config.request_timeout(), config.retry()).unwrap();
        let scheduler = BatchScheduler::new(&config, &client, RepoResolver::new());

        let tools: ToolMap = [tool("tool", &["asdf:someone/asdf-tool", "aqua:owner/tool", "npm:tool"])].into_iter().collect();
        let enriched = scheduler.run(tools, &RecordingProgress::default()).await;
        let tool = &enriched["tool"];

        let urls: Vec<_> = tool.results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://github.com/someone/asdf-tool", "https://github.com/owner/tool"]);

        assert_eq!(tool.links[0].kind, LinkKind::Github);
        assert_eq!(tool.links[0].url, "https://github.com/owner/tool");
        assert!(!tool.links[0].verified);
        assert_eq!(tool.links[1].kind, LinkKind::Npm);
    }

    #[tokio::test]
    async fn test_tool_without_candidates_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let config = config(&server);
        let client = Client::new(None, config.api_url(), config.request_timeout(), config.retry()).unwrap();
        let scheduler = BatchScheduler::new(&config, &client, RepoResolver::new());

        let tools: ToolMap = [tool("plain", &["core:plain"])].into_iter().collect();
        let enriched = scheduler.run(tools, &RecordingProgress::default()).await;
        assert!(enriched["plain"].links.is_empty());
        assert!(enriched["plain"].results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let server = MockServer::start().await;
        let config = config(&server);
        let client = Client::new(None, config.api_url(), config.request_timeout(), config.retry()).unwrap();
        let scheduler = BatchScheduler::new(&config, &client, RepoResolver::new());

        let progress = RecordingProgress::default();
        assert!(scheduler.run(ToolMap::new(), &progress).await.is_empty());
        assert!(progress.batches.lock().unwrap().is_empty());
    }
}

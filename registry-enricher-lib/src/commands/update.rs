use super::Host;
use super::common::{LogLevel, init_logging};
use crate::Result;
use crate::enrich::{BatchScheduler, Client, DEFAULT_API_URL, LogProgress, RepoResolver, RunConfig};
use crate::registry::{filter_by_prefix, load_registry};
use crate::snapshot::{CacheStore, MaxAge, Snapshot, write_snapshot};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use clap::Args;
use ohno::bail;
use std::io::Write;

const LOG_TARGET: &str = "  registry";

/// How many tool names to list before summarizing the rest.
const MAX_LISTED_TOOLS: usize = 10;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Path to the registry document
    #[arg(long, default_value = "registry.toml", value_name = "PATH")]
    pub registry: Utf8PathBuf,

    /// Path to the enriched snapshot, read at start and replaced at the end
    #[arg(long, default_value = "registry-enhanced.json", value_name = "PATH")]
    pub output: Utf8PathBuf,

    /// Only update tools whose name starts with PREFIX (case-insensitive)
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Re-enrich tools even if their cached data is recent
    #[arg(long, visible_alias = "regenerate")]
    pub force: bool,

    /// Re-enrich tools enriched longer ago than AGE, e.g. 2h, 3d, 1w
    #[arg(long, value_name = "AGE", default_value_t = MaxAge::default())]
    pub max_age: MaxAge,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Base URL of the hosting API
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_URL, hide = true)]
    pub api_url: String,

    /// Also record a documentation link for each verified repository
    #[arg(long)]
    pub check_docs: bool,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

impl UpdateArgs {
    fn run_config(&self) -> RunConfig {
        RunConfig::new(self.github_token.clone(), Utc::now())
            .with_api_url(self.api_url.clone())
            .with_prefix(self.prefix.clone())
            .with_force(self.force)
            .with_max_age(self.max_age)
            .with_check_docs(self.check_docs)
    }
}

pub async fn process_update<H: Host>(host: &mut H, args: &UpdateArgs) -> Result<()> {
    init_logging(args.log_level);
    let _ = update(host, &args.registry, &args.output, &args.run_config()).await?;
    Ok(())
}

/// Enrich the tools in `registry` that are due and merge them into the snapshot at `output`.
///
/// Returns the snapshot that was written, or `None` when every selected tool was fresh and
/// the snapshot was left untouched.
pub async fn update<H: Host>(host: &mut H, registry: &Utf8Path, output: &Utf8Path, config: &RunConfig) -> Result<Option<Snapshot>> {
    log::info!(target: LOG_TARGET, "Reading {registry}...");
    let all_tools = load_registry(registry)?;
    let total_configured = all_tools.len();

    let tools = filter_by_prefix(all_tools, config.prefix());
    match config.prefix() {
        Some(prefix) => {
            log::info!(target: LOG_TARGET, "Found {} tools with prefix '{prefix}' (out of {total_configured} total)", tools.len());
            if tools.is_empty() {
                bail!("no tools found with prefix '{prefix}'");
            }
        }
        None => log::info!(target: LOG_TARGET, "Found {} tools (processing all)", tools.len()),
    }

    let store = CacheStore::open(output.as_std_path());
    let selection = store.select(tools, &config.freshness());
    let skipped = selection.skipped();

    log::info!(
        target: LOG_TARGET,
        "Cache settings: max-age={}, force={}",
        config.max_age(),
        if config.force() { "yes" } else { "no" }
    );

    if skipped > 0 {
        let _ = writeln!(host.output(), "Skipping {skipped} recently updated tools (use --force to re-enrich them)");
    }

    if selection.needing_update.is_empty() {
        let _ = writeln!(host.output(), "All tools are up to date, nothing to do (use --force to re-enrich them)");
        return Ok(None);
    }

    let _ = writeln!(host.output(), "Tools to process: {}", list_names(selection.needing_update.keys()));

    log::info!(
        target: LOG_TARGET,
        "GitHub token: {}",
        if config.token().is_some() { "provided" } else { "not provided (rate limited)" }
    );

    let client = Client::new(config.token(), config.api_url(), config.request_timeout(), config.retry())?;
    let scheduler = BatchScheduler::new(config, &client, RepoResolver::new());
    let enriched = scheduler.run(selection.needing_update, &LogProgress).await;
    let processed = enriched.len();

    let mut updates = selection.fresh;
    updates.extend(enriched);
    let snapshot = write_snapshot(store.merge(updates), output.as_std_path(), Utc::now())?;

    let _ = writeln!(
        host.output(),
        "Complete! Processed {processed} tools, enhanced registry now has {} tools with {}/{} verified GitHub repos",
        snapshot.stats.total_tools,
        snapshot.stats.verified_repos,
        snapshot.stats.total_repos,
    );

    if skipped > 0 {
        let _ = writeln!(host.output(), "Skipped {skipped} tools that were recently updated");
    }

    Ok(Some(snapshot))
}

fn list_names<'a>(names: impl ExactSizeIterator<Item = &'a String>) -> String {
    let count = names.len();
    let listed = names.take(MAX_LISTED_TOOLS).map(String::as_str).collect::<Vec<_>>().join(", ");
    if count > MAX_LISTED_TOOLS {
        format!("{listed} ... ({} more)", count - MAX_LISTED_TOOLS)
    } else {
        listed
    }
}

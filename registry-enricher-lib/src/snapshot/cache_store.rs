//! Loading the prior snapshot and deciding which tools to re-enrich.

use super::max_age::MaxAge;
use super::model::{EnrichedTool, EnrichedToolMap, Snapshot};
use crate::registry::ToolMap;
use chrono::{DateTime, TimeDelta, Utc};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "  snapshot";

/// Per-tool rule for whether cached enrichment is still usable.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    force: bool,
    max_age: TimeDelta,
    now: DateTime<Utc>,
}

impl FreshnessPolicy {
    #[must_use]
    pub const fn new(force: bool, max_age: MaxAge, now: DateTime<Utc>) -> Self {
        Self {
            force,
            max_age: max_age.as_delta(),
            now,
        }
    }

    /// A tool needs enrichment when forced, when it has no cached entry or no timestamp,
    /// or when its timestamp is strictly older than the max age.
    ///
    /// A timestamp in the future (clock skew) counts as fresh.
    #[must_use]
    pub fn needs_update(&self, cached: Option<&EnrichedTool>) -> bool {
        if self.force {
            return true;
        }

        let Some(last_enhanced) = cached.and_then(|tool| tool.last_enhanced) else {
            return true;
        };

        self.now.signed_duration_since(last_enhanced) > self.max_age
    }
}

/// How the configured tools split between fresh and due.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Tools to enrich in this run.
    pub needing_update: ToolMap,

    /// Tools whose cached enrichment is kept, with their definitions taken from the configuration.
    pub fresh: EnrichedToolMap,
}

impl Selection {
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.fresh.len()
    }
}

/// The prior snapshot, loaded once at the start of a run.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    snapshot: Snapshot,
}

impl CacheStore {
    /// Load the snapshot at `path`.
    ///
    /// A missing file is an empty snapshot. An unreadable or corrupt file is logged and also
    /// treated as empty; this never fails.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = load(&path).unwrap_or_default();
        Self { path, snapshot }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Split `tools` into those due for enrichment and those whose cached entry is kept.
    #[must_use]
    pub fn select(&self, tools: ToolMap, policy: &FreshnessPolicy) -> Selection {
        let mut selection = Selection::default();

        for (name, tool) in tools {
            let cached = self.snapshot.tools.get(&name);
            if policy.needs_update(cached) {
                log::debug!(target: LOG_TARGET, "'{name}' needs enrichment");
                let _ = selection.needing_update.insert(name, tool);
            } else if let Some(cached) = cached {
                log::debug!(target: LOG_TARGET, "'{name}' is fresh, keeping cached enrichment");
                let _ = selection.fresh.insert(name, cached.clone().with_definition(tool));
            }
        }

        selection
    }

    /// Overlay `updates` onto the prior snapshot, replacing same-named entries wholesale.
    #[must_use]
    pub fn merge(self, updates: EnrichedToolMap) -> Snapshot {
        self.snapshot.merge(updates)
    }
}

fn load(path: &Path) -> Option<Snapshot> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!(target: LOG_TARGET, "No prior snapshot at '{}', starting empty", path.display());
            return None;
        }
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Could not open prior snapshot '{}', starting empty: {e:#}", path.display());
            return None;
        }
    };

    match serde_json::from_reader::<_, Snapshot>(BufReader::new(file)) {
        Ok(snapshot) => {
            log::debug!(target: LOG_TARGET, "Loaded prior snapshot with {} tools", snapshot.tools.len());
            Some(snapshot)
        }
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Could not parse prior snapshot '{}', starting empty: {e:#}", path.display());
            None
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::registry::ToolEntry;
    use crate::snapshot::EnrichmentResult;
    use std::fs;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    fn entry(name: &str, description: &str) -> ToolEntry {
        ToolEntry {
            name: name.to_string(),
            description: Some(description.to_string()),
            ..ToolEntry::default()
        }
    }

    fn enriched(name: &str, last_enhanced: Option<DateTime<Utc>>) -> EnrichedTool {
        EnrichedTool {
            tool: entry(name, "cached"),
            links: Vec::new(),
            results: vec![EnrichmentResult::verified(format!("https://github.com/o/{name}"), 1, Vec::new(), None, None, None)],
            last_enhanced,
        }
    }

    fn policy(force: bool, max_age: &str) -> FreshnessPolicy {
        FreshnessPolicy::new(force, max_age.parse().unwrap(), now())
    }

    #[test]
    fn test_freshness_boundary() {
        let policy = policy(false, "7d");

        let exactly = enriched("x", Some(now() - TimeDelta::days(7)));
        assert!(!policy.needs_update(Some(&exactly)));

        let older = enriched("x", Some(now() - TimeDelta::days(7) - TimeDelta::microseconds(1)));
        assert!(policy.needs_update(Some(&older)));
    }

    #[test]
    fn test_needs_update_rules() {
        let policy = policy(false, "7d");
        assert!(policy.needs_update(None));
        assert!(policy.needs_update(Some(&enriched("x", None))));
        assert!(!policy.needs_update(Some(&enriched("x", Some(now() - TimeDelta::days(1))))));
        assert!(!policy.needs_update(Some(&enriched("x", Some(now() + TimeDelta::days(1))))));
    }

    #[test]
    fn test_force_overrides_freshness() {
        let policy = policy(true, "1w");
        assert!(policy.needs_update(Some(&enriched("x", Some(now())))));
    }

    #[test]
    fn test_ten_day_old_entry_against_max_age() {
        let cached = enriched("x", Some(now() - TimeDelta::days(10)));
        assert!(policy(false, "7d").needs_update(Some(&cached)));
        assert!(!policy(false, "30d").needs_update(Some(&cached)));
    }

    #[test]
    fn test_open_missing_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::open(tmp.path().join("missing.json"));
        assert!(store.snapshot().tools.is_empty());
    }

    #[test]
    fn test_open_corrupt_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("registry-enhanced.json");
        fs::write(&path, "{ not json").unwrap();

        let store = CacheStore::open(&path);
        assert!(store.snapshot().tools.is_empty());
        assert_eq!(store.path(), path);
    }

    #[test]
    fn test_open_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("registry-enhanced.json");
        let snapshot = Snapshot::default().merge([("x".to_string(), enriched("x", Some(now())))]);
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let store = CacheStore::open(&path);
        assert_eq!(store.snapshot(), &snapshot);
    }

    #[test]
    fn test_select_splits_and_refreshes_definitions() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("registry-enhanced.json");
        let snapshot = Snapshot::default().merge([
            ("fresh".to_string(), enriched("fresh", Some(now() - TimeDelta::hours(1)))),
            ("stale".to_string(), enriched("stale", Some(now() - TimeDelta::days(30)))),
        ]);
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();
        let store = CacheStore::open(&path);

        let mut tools = ToolMap::new();
        let _ = tools.insert("fresh".into(), entry("fresh", "current"));
        let _ = tools.insert("stale".into(), entry("stale", "current"));
        let _ = tools.insert("new".into(), entry("new", "current"));

        let selection = store.select(tools, &policy(false, "7d"));
        let due: Vec<_> = selection.needing_update.keys().map(String::as_str).collect();
        assert_eq!(due, vec!["new", "stale"]);
        assert_eq!(selection.skipped(), 1);

        let kept = &selection.fresh["fresh"];
        assert_eq!(kept.tool.description.as_deref(), Some("current"));
        assert_eq!(kept.results, snapshot.tools["fresh"].results);
        assert_eq!(kept.last_enhanced, snapshot.tools["fresh"].last_enhanced);
    }

    #[test]
    fn test_merge_keeps_untouched_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("registry-enhanced.json");
        let snapshot = Snapshot::default().merge([("old".to_string(), enriched("old", Some(now())))]);
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let mut updates = EnrichedToolMap::new();
        let _ = updates.insert("new".into(), enriched("new", Some(now())));

        let merged = CacheStore::open(&path).merge(updates);
        assert_eq!(merged.tools.len(), 2);
        assert_eq!(merged.tools["old"], snapshot.tools["old"]);
        assert_eq!(merged.stats.total_tools, 2);
        assert_eq!(merged.stats.verified_repos, 2);
    }
}

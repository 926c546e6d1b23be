use crate::registry::ToolEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tool name to enriched tool.
pub type EnrichedToolMap = BTreeMap<String, EnrichedTool>;

/// Outcome of one repository lookup against the hosting service.
///
/// Verified results carry the repository metadata; unverified ones carry only an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub url: String,
    pub verified: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrichmentResult {
    #[must_use]
    pub fn verified(
        url: impl Into<String>,
        stars: u64,
        topics: Vec<String>,
        language: Option<String>,
        last_updated: Option<DateTime<Utc>>,
        description: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            verified: true,
            stars: Some(stars),
            topics: Some(topics),
            language,
            last_updated,
            description,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            verified: false,
            stars: None,
            topics: None,
            language: None,
            last_updated: None,
            description: None,
            error: Some(error.into()),
        }
    }
}

/// What a [`Link`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Canonical repository on the primary hosting service
    Github,

    /// Repository on the alternate hosting service
    Gitlab,

    /// npm package page
    Npm,

    /// Python package index page
    Pypi,

    /// Rust crate registry page
    Crates,

    /// Repository readme
    Docs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "type")]
    pub kind: LinkKind,
    pub url: String,
    pub verified: bool,
}

/// A registry tool together with what was learned about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedTool {
    #[serde(flatten)]
    pub tool: ToolEntry,

    #[serde(default)]
    pub links: Vec<Link>,

    /// One entry per attempted repository lookup, in extraction order.
    #[serde(default, rename = "github")]
    pub results: Vec<EnrichmentResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_enhanced: Option<DateTime<Utc>>,
}

impl EnrichedTool {
    /// Keep this tool's enrichment but take its definition from `tool`.
    #[must_use]
    pub fn with_definition(self, tool: ToolEntry) -> Self {
        Self { tool, ..self }
    }

    #[must_use]
    pub fn verified_count(&self) -> usize {
        self.results.iter().filter(|r| r.verified).count()
    }
}

/// Aggregate counters over a snapshot's tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_tools: usize,

    #[serde(rename = "github_repos")]
    pub total_repos: usize,

    pub verified_repos: usize,
}

impl Stats {
    /// Count everything from scratch.
    #[must_use]
    pub fn compute(tools: &EnrichedToolMap) -> Self {
        tools.values().fold(
            Self {
                total_tools: tools.len(),
                ..Self::default()
            },
            |acc, tool| Self {
                total_repos: acc.total_repos + tool.results.len(),
                verified_repos: acc.verified_repos + tool.verified_count(),
                ..acc
            },
        )
    }
}

/// The persisted, mergeable enrichment state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tools: EnrichedToolMap,

    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(default)]
    pub stats: Stats,
}

impl Snapshot {
    /// Overlay `updates` onto this snapshot's tools.
    ///
    /// Same-named entries are replaced wholesale; all other entries survive unchanged.
    /// The counters are recomputed from the merged map afterwards.
    #[must_use]
    pub fn merge(mut self, updates: impl IntoIterator<Item = (String, EnrichedTool)>) -> Self {
        self.tools.extend(updates);
        self.stats = Stats::compute(&self.tools);
        self
    }
}

use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::{IntoAppError, bail};
use std::sync::Arc;
use url::Url;

/// Host name of the primary hosting service.
pub const PRIMARY_HOST: &str = "github.com";

/// An `owner/repo` pair on the primary hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSpec {
    url: Arc<Url>,
    owner: Arc<str>,
    repo: Arc<str>,
}

impl RepoSpec {
    /// Build a spec from a repository URL, discarding any sub-path and a trailing `.git`.
    pub fn parse(url: &Url) -> Result<Self> {
        if url.host_str() != Some(PRIMARY_HOST) {
            bail!("not a {PRIMARY_HOST} repository URL: {url}");
        }

        let path_segments: Vec<_> = url.path_segments().map(Iterator::collect).unwrap_or_default();
        if path_segments.len() < 2 {
            bail!("invalid repository URL format: {url}");
        }

        Self::new(path_segments[0], path_segments[1])
    }

    /// Build a spec from an `owner/repo` path; anything past the second segment is ignored.
    pub fn from_path(path: &str) -> Result<Self> {
        let mut segments = path.trim_matches('/').split('/');
        match (segments.next(), segments.next()) {
            (Some(owner), Some(repo)) => Self::new(owner, repo),
            _ => bail!("invalid repository path, expected 'owner/repo': {path}"),
        }
    }

    fn new(owner: &str, repo: &str) -> Result<Self> {
        let repo = repo.trim_end_matches(".git");
        if owner.is_empty() || repo.is_empty() {
            bail!("invalid repository: empty owner or repo name in '{owner}/{repo}'");
        }

        let url = Url::parse(&format!("https://{PRIMARY_HOST}/{owner}/{repo}")).into_app_err("reconstructing repository URL")?;

        Ok(Self {
            url: Arc::new(url),
            owner: Arc::from(owner),
            repo: Arc::from(repo),
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

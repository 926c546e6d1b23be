use super::repo_spec::{PRIMARY_HOST, RepoSpec};
use crate::registry::{BackendDescriptor, BackendKind};
use crate::snapshot::{Link, LinkKind};
use url::Url;

const LOG_TARGET: &str = "  registry";

/// Name of the plugin manager whose wrapper repositories are ranked lowest.
const PLUGIN_MANAGER: &str = "asdf";

/// Naming convention for plugin wrapper repositories.
const PLUGIN_PREFIX: &str = "asdf-";

/// Organization that hosts an index of plugins rather than tools.
const META_INDEX_ORG: &str = "mise-plugins";

const ALTERNATE_HOST_PREFIX: &str = "https://gitlab.com/";

/// Decides whether a plugin-manager locator points at a thin wrapper rather than the tool itself.
pub trait WrapperPredicate {
    fn is_wrapper(&self, locator: &str) -> bool;
}

/// The default [`WrapperPredicate`], based on repository naming conventions.
///
/// A locator is a wrapper if it contains the `asdf-` naming fragment, has a path segment equal
/// to `asdf`, or belongs to the `mise-plugins` organization. This is a best-effort guess and
/// will misclassify some repositories.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamingHeuristic;

impl WrapperPredicate for NamingHeuristic {
    fn is_wrapper(&self, locator: &str) -> bool {
        if locator.contains(PLUGIN_PREFIX) {
            return true;
        }

        let mut segments = repo_path(locator).split('/').filter(|s| !s.is_empty()).peekable();
        if segments.peek() == Some(&META_INDEX_ORG) {
            return true;
        }

        segments.any(|s| s == PLUGIN_MANAGER)
    }
}

/// Path portion of a locator that may or may not be a full URL.
fn repo_path(locator: &str) -> &str {
    match locator.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => locator,
    }
}

/// A repository on the primary host that a tool might live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCandidate {
    pub repo: RepoSpec,

    /// Lower is preferred.
    pub priority: u8,

    pub source: BackendKind,
}

/// Everything the resolver learned from one tool's backends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Unique candidates in extraction order.
    pub candidates: Vec<RepoCandidate>,

    /// Links to package indexes and alternate hosts, unique by URL.
    pub secondary: Vec<Link>,
}

impl Resolution {
    /// The canonical repository: lowest priority number, earliest on ties.
    #[must_use]
    pub fn selected(&self) -> Option<&RepoCandidate> {
        self.candidates.iter().min_by_key(|c| c.priority)
    }

    /// Add `candidate`, or if its repository is already known, keep the existing slot and
    /// take the better of the two ranks.
    fn add_candidate(&mut self, candidate: RepoCandidate) {
        match self.candidates.iter_mut().find(|c| c.repo == candidate.repo) {
            Some(existing) if candidate.priority < existing.priority => {
                existing.priority = candidate.priority;
                existing.source = candidate.source;
            }
            Some(_) => {}
            None => self.candidates.push(candidate),
        }
    }
}

/// Extracts and ranks repository candidates from backend descriptors.
#[derive(Debug, Clone, Default)]
pub struct RepoResolver<P = NamingHeuristic> {
    predicate: P,
}

impl RepoResolver {
    #[must_use]
    pub const fn new() -> Self {
        Self { predicate: NamingHeuristic }
    }
}

impl<P: WrapperPredicate> RepoResolver<P> {
    #[must_use]
    pub const fn with_predicate(predicate: P) -> Self {
        Self { predicate }
    }

    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, backends: &[S]) -> Resolution {
        let mut resolution = Resolution::default();

        for backend in backends {
            let Some(descriptor) = BackendDescriptor::parse(backend.as_ref()) else {
                log::debug!(target: LOG_TARGET, "Ignoring backend '{}' without a kind", backend.as_ref());
                continue;
            };

            if let Some(candidate) = self.candidate(&descriptor) {
                resolution.add_candidate(candidate);
            }

            if let Some(link) = secondary_link(&descriptor)
                && !resolution.secondary.iter().any(|l| l.url == link.url)
            {
                resolution.secondary.push(link);
            }
        }

        resolution
    }

    fn candidate(&self, descriptor: &BackendDescriptor) -> Option<RepoCandidate> {
        let locator = descriptor.locator();
        let (repo, priority) = match descriptor.kind() {
            BackendKind::Aqua | BackendKind::Ubi => {
                // ubi locators may carry trailing `[exe=...]` style options
                let path = locator.split('[').next().unwrap_or(locator);
                (RepoSpec::from_path(path).ok()?, 1)
            }

            BackendKind::Go => {
                let path = locator.strip_prefix(PRIMARY_HOST)?.strip_prefix('/')?;
                (RepoSpec::from_path(path).ok()?, 2)
            }

            BackendKind::Asdf if locator.starts_with("https://") => {
                let url = Url::parse(locator).ok()?;
                let repo = RepoSpec::parse(&url).ok()?;
                (repo, if self.predicate.is_wrapper(locator) { 4 } else { 3 })
            }

            BackendKind::Asdf if !locator.contains("://") => {
                let repo = RepoSpec::from_path(locator).ok()?;
                if repo.owner() == META_INDEX_ORG {
                    return None;
                }
                (repo, 4)
            }

            _ => return None,
        };

        Some(RepoCandidate {
            repo,
            priority,
            source: descriptor.kind().clone(),
        })
    }
}

/// A link to somewhere other than the primary host, if the descriptor names one.
fn secondary_link(descriptor: &BackendDescriptor) -> Option<Link> {
    let locator = descriptor.locator();
    let is_package_name = !locator.is_empty() && !locator.contains(['/', ':']);

    let (kind, url) = match descriptor.kind() {
        BackendKind::Asdf if locator.starts_with(ALTERNATE_HOST_PREFIX) => (LinkKind::Gitlab, locator.to_string()),
        BackendKind::Npm if !locator.is_empty() => (LinkKind::Npm, format!("https://www.npmjs.com/package/{locator}")),
        BackendKind::Pipx if is_package_name => (LinkKind::Pypi, format!("https://pypi.org/project/{locator}")),
        BackendKind::Cargo if is_package_name => (LinkKind::Crates, format!("https://crates.io/crates/{locator}")),
        _ => return None,
    };

    Some(Link { kind, url, verified: false })
}

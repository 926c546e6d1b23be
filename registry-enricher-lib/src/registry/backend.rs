use core::fmt::{Display, Formatter};
use core::str::FromStr;
use strum::EnumString;

/// The installer a backend descriptor refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    /// Package-build helper with its own registry, locator is `owner/repo`
    Aqua,

    /// Release-download helper, locator is `owner/repo` optionally followed by `[options]`
    Ubi,

    /// Language module path, e.g. `github.com/owner/repo/cmd/tool`
    Go,

    /// Plugin-manager reference, locator is a plugin repository URL or `owner/repo`
    Asdf,

    /// npm package name
    Npm,

    /// Python package name
    Pipx,

    /// Rust crate name
    Cargo,

    /// Anything else
    #[strum(default)]
    Other(String),
}

impl BackendKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Aqua => "aqua",
            Self::Ubi => "ubi",
            Self::Go => "go",
            Self::Asdf => "asdf",
            Self::Npm => "npm",
            Self::Pipx => "pipx",
            Self::Cargo => "cargo",
            Self::Other(tag) => tag,
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `kind:locator` backend string split on its first `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendDescriptor {
    kind: BackendKind,
    locator: String,
}

impl BackendDescriptor {
    /// Parse a backend string, returning `None` when it has no `:`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (kind, locator) = s.split_once(':')?;
        let kind = BackendKind::from_str(kind.trim()).unwrap_or_else(|_| BackendKind::Other(kind.trim().to_string()));
        Some(Self {
            kind,
            locator: locator.trim().to_string(),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> &BackendKind {
        &self.kind
    }

    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }
}

impl Display for BackendDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind, self.locator)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        let d = BackendDescriptor::parse("aqua:rhysd/actionlint").unwrap();
        assert_eq!(d.kind(), &BackendKind::Aqua);
        assert_eq!(d.locator(), "rhysd/actionlint");

        let d = BackendDescriptor::parse("go:github.com/rhysd/actionlint/cmd/actionlint").unwrap();
        assert_eq!(d.kind(), &BackendKind::Go);
        assert_eq!(d.locator(), "github.com/rhysd/actionlint/cmd/actionlint");
    }

    #[test]
    fn test_parse_splits_on_first_colon_only() {
        let d = BackendDescriptor::parse("asdf:https://github.com/owner/repo").unwrap();
        assert_eq!(d.kind(), &BackendKind::Asdf);
        assert_eq!(d.locator(), "https://github.com/owner/repo");
    }

    #[test]
    fn test_parse_unknown_kind() {
        let d = BackendDescriptor::parse("vfox:version-fox/vfox-nodejs").unwrap();
        assert_eq!(d.kind(), &BackendKind::Other("vfox".to_string()));
        assert_eq!(d.to_string(), "vfox:version-fox/vfox-nodejs");
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        let d = BackendDescriptor::parse("Aqua:a/b").unwrap();
        assert_eq!(d.kind(), &BackendKind::Other("Aqua".to_string()));
    }

    #[test]
    fn test_parse_without_colon() {
        assert!(BackendDescriptor::parse("core").is_none());
    }
}

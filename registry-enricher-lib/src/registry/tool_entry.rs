use super::parser::{PropertyValue, parse_registry};
use crate::Result;
use ohno::{IntoAppError, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const LOG_TARGET: &str = "  registry";

/// Tool name to tool definition.
pub type ToolMap = BTreeMap<String, ToolEntry>;

/// One tool as defined in the registry.
///
/// Properties the registry defines beyond the named fields are kept verbatim in `extra`
/// so they round-trip through the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backends: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub os: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<PropertyValue>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, PropertyValue>,
}

impl ToolEntry {
    /// Build an entry from the raw properties recovered by the parser.
    ///
    /// No property is required; a tool with no description or backends is still valid.
    #[must_use]
    pub fn from_properties(name: impl Into<String>, mut properties: BTreeMap<String, PropertyValue>) -> Self {
        let description = match properties.remove("description") {
            Some(PropertyValue::Scalar(s)) => Some(s),
            Some(other) => {
                let _ = properties.insert("description".to_string(), other);
                None
            }
            None => None,
        };

        let mut take_list = |key: &str| properties.remove(key).map(PropertyValue::into_list).unwrap_or_default();
        let backends = take_list("backends");
        let aliases = take_list("aliases");
        let os = take_list("os");

        let test = properties.remove("test");

        Self {
            name: name.into(),
            description,
            backends,
            aliases,
            os,
            test,
            extra: properties,
        }
    }
}

/// Read and parse the registry document at `path`.
///
/// An unreadable document, an empty one, or one that defines no tools is a configuration
/// error and is reported before any network activity happens.
pub fn load_registry(path: impl AsRef<Path>) -> Result<ToolMap> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).into_app_err_with(|| format!("unable to read registry file '{}'", path.display()))?;

    if text.trim().is_empty() {
        bail!("registry file '{}' is empty", path.display());
    }

    let tools: ToolMap = parse_registry(&text)
        .into_iter()
        .map(|(name, properties)| {
            let entry = ToolEntry::from_properties(name.clone(), properties);
            (name, entry)
        })
        .collect();

    if tools.is_empty() {
        bail!("registry file '{}' does not define any tools", path.display());
    }

    log::debug!(target: LOG_TARGET, "Parsed {} tools from '{}'", tools.len(), path.display());
    Ok(tools)
}

/// Keep only the tools whose name starts with `prefix`, ignoring case.
#[must_use]
pub fn filter_by_prefix(tools: ToolMap, prefix: Option<&str>) -> ToolMap {
    let Some(prefix) = prefix else {
        return tools;
    };

    let prefix = prefix.to_lowercase();
    tools
        .into_iter()
        .filter(|(name, _)| name.to_lowercase().starts_with(&prefix))
        .collect()
}

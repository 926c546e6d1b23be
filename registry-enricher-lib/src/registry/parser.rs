use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LOG_TARGET: &str = "  registry";

/// Line that opens the section holding tool definitions.
const TOOLS_SECTION: &str = "[tools]";

/// Separator between a key and its value.
const KEY_VALUE_SEPARATOR: &str = " = ";

/// A raw property value recovered from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    List(Vec<String>),
    Scalar(String),
}

impl PropertyValue {
    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// Returns the value as a list, treating a scalar as a one-element list.
    #[must_use]
    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::List(items) => items,
            Self::Scalar(s) if s.is_empty() => Vec::new(),
            Self::Scalar(s) => vec![s],
        }
    }
}

/// Tool name to property name to raw value.
pub type ToolProperties = BTreeMap<String, BTreeMap<String, PropertyValue>>;

/// Something the state machine recognized on a line.
#[derive(Debug, PartialEq, Eq)]
enum Event {
    /// A tool was mentioned, even if no value could be committed for it yet.
    Declared { tool: String },

    /// A complete value for `tool.property`.
    Property {
        tool: String,
        property: String,
        value: PropertyValue,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum ParserState {
    OutsideSection,
    InsideSection,
    CollectingList {
        tool: String,
        property: String,
        items: Vec<String>,
    },
}

impl ParserState {
    /// Consume one trimmed, non-blank, non-comment line.
    fn step(self, line: &str) -> (Self, Option<Event>) {
        match self {
            Self::OutsideSection if line == TOOLS_SECTION => (Self::InsideSection, None),
            Self::OutsideSection => (Self::OutsideSection, None),

            // There is no closing marker; once open, the section runs to the end of input.
            Self::InsideSection if line == TOOLS_SECTION => (Self::InsideSection, None),
            Self::InsideSection => parse_key_value(line),

            Self::CollectingList { tool, property, items } if line == TOOLS_SECTION => {
                (Self::CollectingList { tool, property, items }, None)
            }
            Self::CollectingList { tool, property, mut items } => {
                if let Some(rest) = line.strip_suffix(']') {
                    items.extend(split_items(rest));
                    let event = Event::Property {
                        tool,
                        property,
                        value: PropertyValue::List(items),
                    };
                    (Self::InsideSection, Some(event))
                } else {
                    items.extend(split_items(line));
                    (Self::CollectingList { tool, property, items }, None)
                }
            }
        }
    }
}

/// Interpret a line inside the tools section.
fn parse_key_value(line: &str) -> (ParserState, Option<Event>) {
    let Some((key, value)) = line.split_once(KEY_VALUE_SEPARATOR) else {
        return (ParserState::InsideSection, None);
    };

    let Some((tool, property)) = key.trim().split_once('.') else {
        return (ParserState::InsideSection, None);
    };

    let tool = tool.to_string();
    let property = property.to_string();

    if value.starts_with('[') && value.ends_with(']') && value.len() >= 2 {
        let items = split_items(&value[1..value.len() - 1]).collect();
        let event = Event::Property {
            tool,
            property,
            value: PropertyValue::List(items),
        };
        return (ParserState::InsideSection, Some(event));
    }

    if let Some(first) = value.strip_prefix('[') {
        let items = split_items(first).collect();
        return (ParserState::CollectingList { tool: tool.clone(), property, items }, Some(Event::Declared { tool }));
    }

    let scalar = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        strip_quotes(value)
    };

    let event = Event::Property {
        tool,
        property,
        value: PropertyValue::Scalar(scalar.to_string()),
    };
    (ParserState::InsideSection, Some(event))
}

/// Strip at most one leading and one trailing quote character.
fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix(['"', '\'']).unwrap_or(s);
    s.strip_suffix(['"', '\'']).unwrap_or(s)
}

/// Split list content on `,`, trimming and unquoting each element and dropping empty ones.
fn split_items(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .split(',')
        .map(|item| strip_quotes(item.trim()))
        .filter(|item| !item.is_empty())
        .map(String::from)
}

/// Parse registry text into a map of tool name to properties.
///
/// Parsing is permissive and never fails: unknown keys, duplicates, and malformed quoting
/// are stored as well as they can be, and later duplicates overwrite earlier ones.
#[must_use]
pub fn parse_registry(text: &str) -> ToolProperties {
    let mut tools = ToolProperties::new();
    let mut state = ParserState::OutsideSection;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (next, event) = state.step(line);
        state = next;

        match event {
            Some(Event::Declared { tool }) => {
                let _ = tools.entry(tool).or_default();
            }
            Some(Event::Property { tool, property, value }) => {
                let _ = tools.entry(tool).or_default().insert(property, value);
            }
            None => {}
        }
    }

    if let ParserState::CollectingList { tool, property, .. } = state {
        log::debug!(target: LOG_TARGET, "List for '{tool}.{property}' is never closed, dropping it");
    }

    tools
}

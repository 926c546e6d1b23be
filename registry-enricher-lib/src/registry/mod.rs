//! Registry parsing
//!
//! The registry is a hand-maintained document in a restricted TOML-like dialect. Only
//! the `[tools]` section is read, and only lines of the form `name.property = value`.
//!
//! # Implementation Model
//!
//! [`parse_registry`] is a tolerant, line-oriented state machine that recovers a map of
//! tool name to raw [`PropertyValue`]s. It never fails: malformed input degrades to
//! partial data. [`ToolEntry::from_properties`] then lifts the raw map into the typed
//! entry used by the rest of the pipeline, and [`BackendDescriptor`] splits each
//! `kind:locator` backend string.

mod backend;
mod parser;
mod tool_entry;

pub use backend::{BackendDescriptor, BackendKind};
pub use parser::{PropertyValue, ToolProperties, parse_registry};
pub use tool_entry::{ToolEntry, ToolMap, filter_by_prefix, load_registry};

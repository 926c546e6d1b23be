#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for registry-enricher
//!
//! This library holds all functionality of the registry-enricher tool, which reads
//! a registry of named tools, looks up each tool's source repository on the hosting
//! service, and persists the result as a mergeable JSON snapshot.
//!
//! # Module Organization
//!
//! - [`registry`]: Parsing the registry document into tool entries
//! - [`enrich`]: Repository resolution, hosting lookups, and batch scheduling
//! - [`snapshot`]: The persisted snapshot, freshness decisions, and merging
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

#[cfg(any(debug_assertions, test))]
pub mod enrich;
#[cfg(not(any(debug_assertions, test)))]
mod enrich;

#[cfg(any(debug_assertions, test))]
pub mod registry;
#[cfg(not(any(debug_assertions, test)))]
mod registry;

#[cfg(any(debug_assertions, test))]
pub mod snapshot;
#[cfg(not(any(debug_assertions, test)))]
mod snapshot;

pub use crate::commands::{Host, run};

//! Command-line interface and orchestration for registry-enricher
//!
//! This module implements the CLI and coordinates the other modules to perform an
//! end-to-end enrichment run. It handles argument parsing, logging setup, and the
//! high-level workflow.
//!
//! # Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! `update` command, which:
//!
//! 1. Parses the registry and applies the prefix filter
//! 2. Loads the prior snapshot and selects the tools that are due
//! 3. Enriches those tools in paced, concurrent batches
//! 4. Merges the results into the snapshot and writes it back
//!
//! All settings are folded into one immutable `RunConfig` before any work starts.

mod common;
mod host;
mod run;
mod update;

pub use common::{LogLevel, init_logging};
pub use host::Host;
pub use run::run;
pub use update::{UpdateArgs, process_update, update};

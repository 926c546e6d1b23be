//! The persisted enrichment snapshot
//!
//! A [`Snapshot`] maps tool names to [`EnrichedTool`]s and carries aggregate [`Stats`]. It is
//! read once at the start of a run through a [`CacheStore`], which decides per tool whether
//! the cached enrichment is still fresh, and written once at the end by [`write_snapshot`].
//!
//! The counters are never patched incrementally; they are recomputed from the tool map every
//! time the map changes, so a snapshot is self-consistent no matter how many merges built it.

mod cache_store;
mod max_age;
mod model;
mod writer;

pub use cache_store::{CacheStore, FreshnessPolicy, Selection};
pub use max_age::MaxAge;
pub use model::{EnrichedTool, EnrichedToolMap, EnrichmentResult, Link, LinkKind, Snapshot, Stats};
pub use writer::write_snapshot;

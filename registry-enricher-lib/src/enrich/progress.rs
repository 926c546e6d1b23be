use crate::snapshot::EnrichedToolMap;

const LOG_TARGET: &str = " scheduler";

/// A trait for reporting progress of an enrichment run.
pub trait Progress {
    /// A tool's enrichment is starting.
    fn tool_started(&self, name: &str);

    /// Batch `index` of `total` (one-based) has finished and been merged into `completed`.
    fn batch_completed(&self, index: usize, total: usize, completed: &EnrichedToolMap);
}

/// Reports progress as informational log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn tool_started(&self, name: &str) {
        log::info!(target: LOG_TARGET, "Processing {name}...");
    }

    fn batch_completed(&self, index: usize, total: usize, completed: &EnrichedToolMap) {
        log::info!(target: LOG_TARGET, "Completed batch {index}/{total} ({} tools enriched)", completed.len());
    }
}

use serde::{Deserialize, Serialize};
use storysync_store::HandleCounts;

/// Statistics for one consolidation run. Serialized alongside the snapshot
/// so partial-failure runs are diagnosable after the fact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records presented to the run, before deduplication.
    pub records_in: usize,
    pub duplicates_dropped: usize,
    pub sessions: usize,
    /// Sequence ids assigned to newly accepted records this run.
    pub ids_assigned: usize,
    pub handles: HandleCounts,
    /// True when the run was cut short by the cancellation signal; the
    /// output is valid but partial.
    pub cancelled: bool,
    pub time_ms: u64,
}

impl RunSummary {
    pub fn records_out(&self) -> usize {
        self.records_in - self.duplicates_dropped
    }
}

use crate::handle::ResolveOutcome;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared outcome counters for a signing pass. Updated atomically from
/// concurrent workers, snapshotted once the pass drains.
#[derive(Debug, Default)]
pub struct HandleCounters {
    generated: AtomicUsize,
    reused: AtomicUsize,
    missing: AtomicUsize,
    errors: AtomicUsize,
}

impl HandleCounters {
    pub fn record(&self, outcome: ResolveOutcome) {
        let counter = match outcome {
            ResolveOutcome::Generated => &self.generated,
            ResolveOutcome::Reused => &self.reused,
            ResolveOutcome::Missing => &self.missing,
            ResolveOutcome::Errored => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HandleCounts {
        HandleCounts {
            generated: self.generated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            missing: self.missing.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Immutable counter snapshot surfaced in the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleCounts {
    pub generated: usize,
    pub reused: usize,
    pub missing: usize,
    pub errors: usize,
}

impl HandleCounts {
    /// Handles usable after the pass (fresh or reused).
    pub fn available(&self) -> usize {
        self.generated + self.reused
    }

    pub fn attempted(&self) -> usize {
        self.generated + self.reused + self.missing + self.errors
    }
}

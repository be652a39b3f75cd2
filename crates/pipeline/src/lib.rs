//! # Storysync Pipeline
//!
//! Session assembly over raw activity records.
//!
//! ## Pipeline
//!
//! ```text
//! RawRecord stream (one or more stages)
//!     │
//!     ├──> Identity Resolver (first-seen-wins dedup)
//!     │      └─> unique records
//!     │
//!     ├──> Session Clusterer (per-entity 600 s greedy merge)
//!     │      └─> merged sessions, flattened member order
//!     │
//!     ├──> Resource Handle Cache (storysync-store, bounded fan-out)
//!     │      └─> side table of handles
//!     │
//!     └──> Sequence Allocator (stable external ids)
//!            └─> consolidated run + summary
//! ```
//!
//! Identity resolution and clustering are single-pass and order-sensitive;
//! only the handle-cache step runs concurrently.

mod cluster;
mod error;
mod gather;
mod identity;
mod run;
mod sequence;
mod source;
mod stats;

pub use cluster::{cluster, MERGE_THRESHOLD_SECS};
pub use error::{PipelineError, Result};
pub use gather::{scan_sources, GatherOutcome, SkippedSource};
pub use identity::resolve;
pub use run::{consolidate, ConsolidateOptions, ConsolidatedRun};
pub use sequence::SequenceAllocator;
pub use source::{RecordSource, ScanPredicate, SourceError};
pub use stats::RunSummary;

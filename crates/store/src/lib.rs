//! # Storysync Store
//!
//! Object-store access and the resource-handle cache.
//!
//! The [`ObjectStore`] trait is the only seam to the real backing store;
//! everything else is pure decision logic: whether an existing signed URL is
//! structurally reusable, and bounded concurrent regeneration of the ones
//! that are not.
//!
//! ```text
//! HandleJob ─┬─> reuse check (pure, no I/O)
//!            └─> exists + sign (timeout-bounded, semaphore-limited)
//!                   └─> ResourceHandle + {generated,reused,missing,errors}
//! ```

mod bulk;
mod error;
mod handle;
mod object_store;
mod stats;

pub use bulk::{resolve_all, BulkOutcome, HandleJob, JobResult};
pub use error::{ObjectStoreError, Result};
pub use handle::{
    handle_is_reusable, resolve_handle, url_is_reusable, ResolveOutcome, SignOptions, SignRequest,
    SIGNATURE_MARKERS,
};
pub use object_store::ObjectStore;
pub use stats::{HandleCounters, HandleCounts};

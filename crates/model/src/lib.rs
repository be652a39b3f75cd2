//! # Storysync Model
//!
//! Shared data model for the storysync pipeline.
//!
//! Records flow through the pipeline as immutable [`RawRecord`] values; every
//! derived artifact (signed-URL handles, assigned sequence ids) lives in a
//! side table keyed by [`IdentityKey`] so that observed fields are never
//! rewritten in place.

mod config;
mod record;
mod session;
pub mod timefmt;

pub use config::{ConfigError, StageConfig, StagesConfig, DEFAULT_URL_TTL_SECS};
pub use record::{
    AnnotatedRecord, HandleErrorKind, IdentityKey, RawRecord, RecordAnnotations, ResourceHandle,
};
pub use session::{MergedSession, SessionWindow};

use async_trait::async_trait;
use storysync_model::RawRecord;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source exists but cannot be reached right now; the caller may
    /// retry on a later run.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// No configuration for this source tag. Fatal to that source only.
    #[error("Source not configured: {0}")]
    NotConfigured(String),
}

/// Filter evaluated while scanning a source, standing in for whatever
/// server-side condition the backing table supports. Adapters that can
/// push the condition down may still apply it locally to the result.
pub type ScanPredicate<'a> = &'a (dyn Fn(&RawRecord) -> bool + Send + Sync);

/// External store of raw records (one per stage). Adapters tag every record
/// they yield with their own `source_tag`.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Records for one entity inside a closed time range (ISO-8601 bounds).
    async fn query(
        &self,
        entity_id: &str,
        range_start: &str,
        range_end: &str,
    ) -> Result<Vec<RawRecord>, SourceError>;

    /// Activity records the stage holds that satisfy `predicate`.
    async fn scan(
        &self,
        source_tag: &str,
        predicate: ScanPredicate<'_>,
    ) -> Result<Vec<RawRecord>, SourceError>;
}

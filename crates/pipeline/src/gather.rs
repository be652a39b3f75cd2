use crate::source::{RecordSource, ScanPredicate, SourceError};
use std::sync::Arc;
use storysync_model::RawRecord;

/// A source that could not contribute to this run. Skipped, not fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub source_tag: String,
    pub error: SourceError,
}

#[derive(Debug, Default)]
pub struct GatherOutcome {
    /// All records from all reachable sources, in source order.
    pub records: Vec<RawRecord>,
    pub skipped: Vec<SkippedSource>,
}

/// Scan every configured source in order, concatenating what each yields.
///
/// An unconfigured or unreachable source is logged and skipped so the rest
/// of the run can proceed; the skip list is surfaced to the caller.
pub async fn scan_sources(
    sources: &[(String, Arc<dyn RecordSource>)],
    predicate: ScanPredicate<'_>,
) -> GatherOutcome {
    let mut outcome = GatherOutcome::default();
    for (source_tag, source) in sources {
        match source.scan(source_tag, predicate).await {
            Ok(records) => {
                log::info!("source {source_tag}: {} record(s)", records.len());
                outcome.records.extend(records);
            }
            Err(error) => {
                log::warn!("skipping source {source_tag}: {error}");
                outcome.skipped.push(SkippedSource {
                    source_tag: source_tag.clone(),
                    error,
                });
            }
        }
    }
    outcome
}

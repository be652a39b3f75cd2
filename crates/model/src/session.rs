use crate::record::RawRecord;
use serde::{Deserialize, Serialize};

/// A candidate time window before merging: one explicit `(session_start,
/// session_end)` group, or a singleton `(timestamp, timestamp)` window.
///
/// `members` are sorted ascending by timestamp; bounds are ISO-8601 UTC
/// strings compared lexicographically (valid for the shared `Z`-suffixed,
/// zero-padded format).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start: String,
    pub end: String,
    pub members: Vec<RawRecord>,
}

impl SessionWindow {
    pub fn singleton(record: RawRecord) -> Self {
        let anchor = record.timestamp_or_empty().to_string();
        Self {
            start: anchor.clone(),
            end: anchor,
            members: vec![record],
        }
    }
}

/// Result of clustering: the same shape as [`SessionWindow`], but `members`
/// may be drawn from several original windows. For one entity the set of
/// merged sessions partitions every deduplicated input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedSession {
    pub entity_id: String,
    pub start: String,
    pub end: String,
    pub members: Vec<RawRecord>,
}

impl MergedSession {
    pub fn from_window(entity_id: &str, window: SessionWindow) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            start: window.start,
            end: window.end,
            members: window.members,
        }
    }
}

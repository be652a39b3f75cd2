use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed activity event as produced by a source adapter.
///
/// Observed fields are immutable once constructed; the pipeline only reads
/// them. Derived state (handles, sequence ids) lives in [`RecordAnnotations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawRecord {
    /// Owning gamer/session entity.
    pub entity_id: String,
    /// Deployment stage the record was observed in.
    pub source_tag: String,
    /// Primary time anchor, ISO-8601 UTC (`Z`-suffixed). Absent on a few
    /// malformed legacy rows; those collapse onto one identity per
    /// `(source_tag, entity_id)`.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Explicit session bounds when the recorder knew them.
    #[serde(default)]
    pub session_start: Option<String>,
    #[serde(default)]
    pub session_end: Option<String>,
    /// Object-store key of the video media, if any.
    #[serde(default)]
    pub media_ref: Option<String>,
    /// Object-store key of the thumbnail, if any.
    #[serde(default)]
    pub thumbnail_ref: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub gameserver_ref: Option<String>,
    #[serde(default)]
    pub viewed: bool,
}

impl RawRecord {
    /// Deduplication key: `(source_tag, entity_id, timestamp)`.
    ///
    /// A missing timestamp contributes the empty string, so timestamp-less
    /// records share one key per `(source_tag, entity_id)`. Existing stored
    /// identifiers depend on that collapse; do not special-case it.
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            source_tag: self.source_tag.clone(),
            entity_id: self.entity_id.clone(),
            timestamp: self.timestamp.clone().unwrap_or_default(),
        }
    }

    /// Timestamp as a comparable string (empty when absent).
    pub fn timestamp_or_empty(&self) -> &str {
        self.timestamp.as_deref().unwrap_or("")
    }
}

/// Deterministic composite key identifying one underlying event across
/// sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    pub source_tag: String,
    pub entity_id: String,
    pub timestamp: String,
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}#{}", self.source_tag, self.entity_id, self.timestamp)
    }
}

/// Outcome class carried by a [`ResourceHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HandleErrorKind {
    /// Handle is healthy (or was never attempted).
    #[default]
    None,
    /// Backing object confirmed absent; terminal for the pass.
    NotFound,
    /// Signer/store failure that a later run may retry.
    TransientError,
}

/// A time-limited signed reference to a stored media object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    /// Object-store key the handle was derived from.
    pub key: String,
    /// Signed URL; `None` when generation failed.
    #[serde(default)]
    pub url: Option<String>,
    /// When the URL was generated. Only set on success.
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: HandleErrorKind,
    /// Raw signer message, preserved when the caller opts not to suppress it.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ResourceHandle {
    pub fn is_error(&self) -> bool {
        self.error != HandleErrorKind::None
    }
}

/// Derived state for one record, keyed by its [`IdentityKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecordAnnotations {
    #[serde(default)]
    pub video_handle: Option<ResourceHandle>,
    #[serde(default)]
    pub thumbnail_handle: Option<ResourceHandle>,
    /// Externally visible id assigned by the sequence allocator.
    #[serde(default)]
    pub sequence_id: Option<String>,
}

impl RecordAnnotations {
    pub fn is_empty(&self) -> bool {
        self.video_handle.is_none() && self.thumbnail_handle.is_none() && self.sequence_id.is_none()
    }
}

/// Snapshot row: a record joined with its annotations. This is the durable
/// JSON shape the CLI reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: RawRecord,
    #[serde(flatten)]
    pub annotations: RecordAnnotations,
}

impl From<RawRecord> for AnnotatedRecord {
    fn from(record: RawRecord) -> Self {
        Self {
            record,
            annotations: RecordAnnotations::default(),
        }
    }
}

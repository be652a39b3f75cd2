use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use storysync_model::{
    AnnotatedRecord, HandleErrorKind, RawRecord, RecordAnnotations, ResourceHandle, StagesConfig,
};
use storysync_pipeline::{consolidate, ConsolidateOptions, PipelineError};
use storysync_store::{ObjectStore, ObjectStoreError};
use tokio_util::sync::CancellationToken;

const BASE: &str = "2025-11-24T10:00:00.000Z";

fn ts(offset_secs: i64) -> String {
    let base = storysync_model::timefmt::parse_instant(BASE).expect("base");
    (base + Duration::seconds(offset_secs))
        .with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

fn stages() -> StagesConfig {
    StagesConfig::from_json(
        r#"{
            "stages": {
                "prod": {"table": "EventsTable-prod", "region": "us-east-1", "bucket": "media-prod"},
                "dev": {"table": "EventsTable-dev", "region": "us-east-1", "bucket": "media-dev"}
            }
        }"#,
    )
    .expect("stage config")
}

struct MemoryStore {
    missing: HashSet<String>,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            missing: HashSet::new(),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        Ok(!self.missing.contains(key))
    }

    async fn sign(&self, key: &str, ttl_secs: u64) -> Result<String, ObjectStoreError> {
        Ok(format!(
            "https://media/{key}?X-Amz-Expires={ttl_secs}&Signature=sig"
        ))
    }
}

fn record(source: &str, entity: &str, offset_secs: i64) -> AnnotatedRecord {
    AnnotatedRecord::from(RawRecord {
        entity_id: entity.to_string(),
        source_tag: source.to_string(),
        timestamp: Some(ts(offset_secs)),
        media_ref: Some(format!("clips/{entity}/{offset_secs}.mp4")),
        thumbnail_ref: Some(format!("thumbs/{entity}/{offset_secs}.jpg")),
        ..RawRecord::default()
    })
}

fn options() -> ConsolidateOptions {
    ConsolidateOptions {
        sequence_seed: Some(1),
        ..ConsolidateOptions::default()
    }
}

#[tokio::test]
async fn end_to_end_consolidation() {
    // Two records 300 s apart form one session; a third 700 s past the
    // session end starts another.
    let input = vec![
        record("prod", "G#1", 0),
        record("prod", "G#1", 300),
        record("prod", "G#1", 1000),
    ];

    let run = consolidate(
        input,
        &stages(),
        Arc::new(MemoryStore::new()),
        &options(),
        CancellationToken::new(),
    )
    .await
    .expect("consolidate");

    assert_eq!(run.sessions.len(), 2);
    assert_eq!(run.sessions[0].members.len(), 2);
    assert_eq!(run.sessions[1].members.len(), 1);
    assert_eq!(run.summary.records_in, 3);
    assert_eq!(run.summary.duplicates_dropped, 0);
    assert_eq!(run.summary.handles.generated, 3);
    assert!(!run.summary.cancelled);

    // Every record carries a fresh handle and a sequence id.
    for (i, annotated) in run.records.iter().enumerate() {
        let video = annotated.annotations.video_handle.as_ref().expect("video");
        assert_eq!(video.error, HandleErrorKind::None);
        assert!(video.url.as_deref().unwrap().contains("X-Amz-Expires"));
        assert!(annotated.annotations.thumbnail_handle.is_some());
        assert_eq!(
            annotated.annotations.sequence_id.as_deref(),
            Some(format!("demo{:03}", i + 1).as_str())
        );
    }
}

#[tokio::test]
async fn cross_stage_duplicates_are_dropped_before_clustering() {
    // The same event observed from prod twice; first one wins.
    let mut duplicate = record("prod", "G#1", 0);
    duplicate.record.description = "later copy".to_string();
    let input = vec![record("prod", "G#1", 0), duplicate, record("dev", "G#1", 0)];

    let run = consolidate(
        input,
        &stages(),
        Arc::new(MemoryStore::new()),
        &options(),
        CancellationToken::new(),
    )
    .await
    .expect("consolidate");

    assert_eq!(run.summary.duplicates_dropped, 1);
    // prod and dev copies are distinct identities but cluster together.
    assert_eq!(run.sessions.len(), 1);
    assert_eq!(run.sessions[0].members.len(), 2);
    assert!(run
        .records
        .iter()
        .all(|r| r.record.description != "later copy"));
}

#[tokio::test]
async fn prior_handles_and_ids_are_reused() {
    let mut seeded = record("prod", "G#1", 0);
    seeded.annotations = RecordAnnotations {
        video_handle: Some(ResourceHandle {
            key: "clips/G#1/0.mp4".to_string(),
            url: Some("https://media/clips/G%231/0.mp4?X-Amz-Expires=600&Signature=old".to_string()),
            generated_at: None,
            error: HandleErrorKind::None,
            error_message: None,
        }),
        thumbnail_handle: None,
        sequence_id: Some("demo005".to_string()),
    };
    let input = vec![seeded, record("prod", "G#1", 300)];

    let run = consolidate(
        input,
        &stages(),
        Arc::new(MemoryStore::new()),
        &options(),
        CancellationToken::new(),
    )
    .await
    .expect("consolidate");

    assert_eq!(run.summary.handles.reused, 1);
    assert_eq!(run.summary.handles.generated, 1);
    assert_eq!(run.summary.ids_assigned, 1);

    let seeded_out = run
        .records
        .iter()
        .find(|r| r.record.timestamp_or_empty() == ts(0))
        .expect("seeded record");
    assert_eq!(seeded_out.annotations.sequence_id.as_deref(), Some("demo005"));
    assert!(seeded_out
        .annotations
        .video_handle
        .as_ref()
        .unwrap()
        .url
        .as_deref()
        .unwrap()
        .contains("Signature=old"));

    // The new record allocates above the persisted maximum.
    let fresh = run
        .records
        .iter()
        .find(|r| r.record.timestamp_or_empty() == ts(300))
        .expect("fresh record");
    assert_eq!(fresh.annotations.sequence_id.as_deref(), Some("demo006"));
}

#[tokio::test]
async fn missing_objects_are_recorded_not_raised() {
    let mut store = MemoryStore::new();
    store.missing.insert("clips/G#1/0.mp4".to_string());

    let run = consolidate(
        vec![record("prod", "G#1", 0)],
        &stages(),
        Arc::new(store),
        &options(),
        CancellationToken::new(),
    )
    .await
    .expect("consolidate");

    assert_eq!(run.summary.handles.missing, 1);
    let handle = run.records[0]
        .annotations
        .video_handle
        .as_ref()
        .expect("handle");
    assert_eq!(handle.error, HandleErrorKind::NotFound);
    assert!(handle.url.is_none());
}

#[tokio::test]
async fn records_without_any_configured_stage_abort_the_run() {
    let input = vec![record("prod-old", "G#1", 0)];
    let err = consolidate(
        input,
        &stages(),
        Arc::new(MemoryStore::new()),
        &options(),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
}

#[tokio::test]
async fn unknown_stage_for_one_record_is_skipped_and_counted() {
    let input = vec![record("prod", "G#1", 0), record("prod-old", "G#2", 0)];
    let run = consolidate(
        input,
        &stages(),
        Arc::new(MemoryStore::new()),
        &options(),
        CancellationToken::new(),
    )
    .await
    .expect("consolidate");

    assert_eq!(run.summary.handles.generated, 1);
    assert_eq!(run.summary.handles.errors, 1);
    let orphan = run
        .records
        .iter()
        .find(|r| r.record.source_tag == "prod-old")
        .expect("orphan record");
    assert!(orphan.annotations.video_handle.is_none());
}

#[tokio::test]
async fn reusable_handle_survives_an_unconfigured_stage() {
    // Reuse is structural; a record from a stage that has since been
    // dropped from the config keeps its still-valid URL instead of being
    // counted as an error.
    let mut legacy = record("prod-old", "G#1", 0);
    legacy.annotations.video_handle = Some(ResourceHandle {
        key: "clips/G#1/0.mp4".to_string(),
        url: Some("https://media/clips/G%231/0.mp4?X-Amz-Expires=600&Signature=old".to_string()),
        generated_at: None,
        error: HandleErrorKind::None,
        error_message: None,
    });
    let input = vec![legacy, record("prod", "G#2", 0)];

    let run = consolidate(
        input,
        &stages(),
        Arc::new(MemoryStore::new()),
        &options(),
        CancellationToken::new(),
    )
    .await
    .expect("consolidate");

    assert_eq!(run.summary.handles.reused, 1);
    assert_eq!(run.summary.handles.generated, 1);
    assert_eq!(run.summary.handles.errors, 0);
    let legacy_out = run
        .records
        .iter()
        .find(|r| r.record.source_tag == "prod-old")
        .expect("legacy record");
    assert!(legacy_out
        .annotations
        .video_handle
        .as_ref()
        .unwrap()
        .url
        .as_deref()
        .unwrap()
        .contains("Signature=old"));
}

#[tokio::test]
async fn failed_thumbnail_refresh_keeps_the_previous_handle() {
    let mut store = MemoryStore::new();
    store.missing.insert("thumbs/G#1/0.jpg".to_string());

    // The stored thumbnail URL lacks signature markers, so a refresh is
    // attempted; when the object turns out to be gone the old handle stays.
    let previous = ResourceHandle {
        key: "thumbs/G#1/0.jpg".to_string(),
        url: Some("https://media/thumbs/G%231/0.jpg".to_string()),
        generated_at: None,
        error: HandleErrorKind::None,
        error_message: None,
    };
    let mut seeded = record("prod", "G#1", 0);
    seeded.annotations.thumbnail_handle = Some(previous.clone());

    let run = consolidate(
        vec![seeded],
        &stages(),
        Arc::new(store),
        &options(),
        CancellationToken::new(),
    )
    .await
    .expect("consolidate");

    let out = &run.records[0].annotations;
    assert_eq!(out.thumbnail_handle.as_ref(), Some(&previous));
    // The video handle is unaffected by the thumbnail failure.
    assert_eq!(
        out.video_handle.as_ref().unwrap().error,
        HandleErrorKind::None
    );
}

#[tokio::test]
async fn missing_allocation_seed_on_first_run_is_fatal() {
    let opts = ConsolidateOptions::default();
    let err = consolidate(
        vec![record("prod", "G#1", 0)],
        &stages(),
        Arc::new(MemoryStore::new()),
        &opts,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::Allocation(_)));
}

#[tokio::test]
async fn consolidation_is_idempotent_over_its_own_output() {
    let input = vec![
        record("prod", "G#1", 0),
        record("prod", "G#1", 300),
        record("dev", "G#2", 0),
    ];
    let first = consolidate(
        input,
        &stages(),
        Arc::new(MemoryStore::new()),
        &options(),
        CancellationToken::new(),
    )
    .await
    .expect("first run");

    let second = consolidate(
        first.records.clone(),
        &stages(),
        Arc::new(MemoryStore::new()),
        &options(),
        CancellationToken::new(),
    )
    .await
    .expect("second run");

    // Nothing new to drop, sign, or allocate.
    assert_eq!(second.summary.duplicates_dropped, 0);
    assert_eq!(second.summary.handles.reused, 3);
    assert_eq!(second.summary.handles.generated, 0);
    assert_eq!(second.summary.ids_assigned, 0);
    assert_eq!(second.sessions, first.sessions);
}

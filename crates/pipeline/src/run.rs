use crate::cluster::cluster;
use crate::error::{PipelineError, Result};
use crate::identity::resolve;
use crate::sequence::SequenceAllocator;
use crate::stats::RunSummary;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use storysync_model::{
    AnnotatedRecord, HandleErrorKind, IdentityKey, MergedSession, RawRecord, RecordAnnotations,
    ResourceHandle, StagesConfig, DEFAULT_URL_TTL_SECS,
};
use storysync_store::{
    handle_is_reusable, resolve_all, HandleJob, ObjectStore, SignOptions, SignRequest,
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ConsolidateOptions {
    pub sign: SignOptions,
    pub sequence_prefix: String,
    pub sequence_pad_width: usize,
    /// Starting sequence value for first-ever runs.
    pub sequence_seed: Option<u64>,
}

impl Default for ConsolidateOptions {
    fn default() -> Self {
        Self {
            sign: SignOptions::default(),
            sequence_prefix: "demo".to_string(),
            sequence_pad_width: 3,
            sequence_seed: None,
        }
    }
}

/// Output of one consolidation run: merged sessions, the flattened annotated
/// record list in session order, and run statistics.
#[derive(Debug)]
pub struct ConsolidatedRun {
    pub sessions: Vec<MergedSession>,
    pub records: Vec<AnnotatedRecord>,
    pub summary: RunSummary,
}

/// Run the full pipeline over an in-memory snapshot.
///
/// Stages: dedup -> per-entity clustering -> flattened member order ->
/// concurrent handle resolution -> sequence ids for records that lack one.
/// Deterministic given deterministic input, apart from `generated_at` on
/// freshly signed handles. Per-record signing failures are recorded on the
/// handles themselves; only configuration and allocation problems abort.
pub async fn consolidate(
    input: Vec<AnnotatedRecord>,
    stages: &StagesConfig,
    store: Arc<dyn ObjectStore>,
    opts: &ConsolidateOptions,
    cancel: CancellationToken,
) -> Result<ConsolidatedRun> {
    let started = Instant::now();
    let records_in = input.len();

    // Side table of prior annotations, keyed like the dedup pass so the
    // surviving record keeps the first-seen annotations.
    let mut side: HashMap<IdentityKey, RecordAnnotations> = HashMap::new();
    let mut raw: Vec<RawRecord> = Vec::with_capacity(records_in);
    for annotated in input {
        side.entry(annotated.record.identity_key())
            .or_insert(annotated.annotations);
        raw.push(annotated.record);
    }

    let unique = resolve(raw);
    let duplicates_dropped = records_in - unique.len();

    if !unique.is_empty() && !unique.iter().any(|r| stages.contains(&r.source_tag)) {
        return Err(PipelineError::Configuration(
            "no record matches any configured stage".to_string(),
        ));
    }

    let sessions = cluster(unique);
    let flattened: Vec<RawRecord> = sessions
        .iter()
        .flat_map(|session| session.members.iter().cloned())
        .collect();

    // One signing job per record, in flattened order. Reuse is purely
    // structural, so a prior handle that still qualifies is honored even
    // when the record's stage has no configuration; only a fresh signature
    // needs the stage. Records that need signing but have no media key or
    // no configured stage are skipped and counted as errors.
    let mut jobs: Vec<HandleJob> = Vec::with_capacity(flattened.len());
    let mut skipped_jobs = 0usize;
    for record in &flattened {
        let annotations = side.get(&record.identity_key());
        let stage = stages.stage(&record.source_tag).ok();
        let ttl_secs = stage.map_or(DEFAULT_URL_TTL_SECS, |s| s.url_ttl_secs);
        let can_reuse = |existing: &Option<ResourceHandle>| {
            !opts.sign.force && existing.as_ref().map(handle_is_reusable).unwrap_or(false)
        };

        let video = match record.media_ref.as_deref() {
            Some(key) if !key.is_empty() => {
                let existing = annotations.and_then(|a| a.video_handle.clone());
                if stage.is_some() || can_reuse(&existing) {
                    Some(SignRequest {
                        key: key.to_string(),
                        existing,
                        ttl_secs,
                    })
                } else {
                    log::warn!(
                        "cannot sign {key}: stage {} is not configured",
                        record.source_tag
                    );
                    skipped_jobs += 1;
                    None
                }
            }
            _ => {
                skipped_jobs += 1;
                None
            }
        };
        let thumbnail = record
            .thumbnail_ref
            .as_deref()
            .filter(|key| !key.is_empty())
            .and_then(|key| {
                let existing = annotations.and_then(|a| a.thumbnail_handle.clone());
                (stage.is_some() || can_reuse(&existing)).then(|| SignRequest {
                    key: key.to_string(),
                    existing,
                    ttl_secs,
                })
            });
        jobs.push(HandleJob { video, thumbnail });
    }

    let bulk = resolve_all(store, jobs, opts.sign.clone(), cancel).await;
    for (record, slot) in flattened.iter().zip(bulk.results.into_iter()) {
        let Some(result) = slot else {
            // Never issued (cancelled); prior annotations stay as they were.
            continue;
        };
        let entry = side.entry(record.identity_key()).or_default();
        if let Some((handle, _)) = result.video {
            entry.video_handle = Some(handle);
        }
        // Thumbnails only replace the stored handle on success; a failed
        // refresh keeps whatever the previous run left behind.
        if let Some(handle) = result.thumbnail {
            if handle.error == HandleErrorKind::None {
                entry.thumbnail_handle = Some(handle);
            }
        }
    }

    let mut counts = bulk.counts;
    counts.errors += skipped_jobs;

    // Assign sequence ids to records that still lack one, in flattened
    // order, above the maximum already persisted anywhere in the snapshot.
    let existing_ids: Vec<String> = side
        .values()
        .filter_map(|a| a.sequence_id.clone())
        .collect();
    let needs_id: Vec<IdentityKey> = flattened
        .iter()
        .map(RawRecord::identity_key)
        .filter(|key| {
            side.get(key)
                .map(|a| a.sequence_id.is_none())
                .unwrap_or(true)
        })
        .collect();
    let mut ids_assigned = 0usize;
    if !needs_id.is_empty() {
        let mut allocator =
            SequenceAllocator::new(opts.sequence_prefix.clone(), opts.sequence_pad_width);
        if let Some(seed) = opts.sequence_seed {
            allocator = allocator.with_seed(seed);
        }
        let batch = allocator.allocate_batch(&existing_ids, needs_id.len())?;
        for (key, id) in needs_id.into_iter().zip(batch) {
            side.entry(key).or_default().sequence_id = Some(id);
            ids_assigned += 1;
        }
    }

    let records: Vec<AnnotatedRecord> = flattened
        .into_iter()
        .map(|record| {
            let annotations = side.get(&record.identity_key()).cloned().unwrap_or_default();
            AnnotatedRecord {
                record,
                annotations,
            }
        })
        .collect();

    let summary = RunSummary {
        records_in,
        duplicates_dropped,
        sessions: sessions.len(),
        ids_assigned,
        handles: counts,
        cancelled: bulk.cancelled,
        time_ms: started.elapsed().as_millis() as u64,
    };
    log::info!(
        "consolidated {} record(s) into {} session(s): {} signed, {} reused, {} missing, {} errors{}",
        summary.records_out(),
        summary.sessions,
        counts.generated,
        counts.reused,
        counts.missing,
        counts.errors,
        if summary.cancelled { " (cancelled)" } else { "" }
    );

    Ok(ConsolidatedRun {
        sessions,
        records,
        summary,
    })
}

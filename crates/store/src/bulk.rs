use crate::handle::{resolve_handle, ResolveOutcome, SignOptions, SignRequest};
use crate::object_store::ObjectStore;
use crate::stats::{HandleCounters, HandleCounts};
use std::sync::Arc;
use storysync_model::ResourceHandle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Work for one record: the primary (video) handle and, optionally, its
/// thumbnail. The thumbnail is resolved independently and its failure never
/// blocks or invalidates the primary handle.
#[derive(Debug, Clone, Default)]
pub struct HandleJob {
    pub video: Option<SignRequest>,
    pub thumbnail: Option<SignRequest>,
}

/// Result slot for one job. Thumbnail outcomes are attached but do not feed
/// the counters; only primary handles are counted.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub video: Option<(ResourceHandle, ResolveOutcome)>,
    pub thumbnail: Option<ResourceHandle>,
}

/// Outcome of a bulk pass. `results[i]` corresponds to `jobs[i]` regardless
/// of completion order; `None` means the job was never issued because the
/// pass was cancelled first.
#[derive(Debug)]
pub struct BulkOutcome {
    pub results: Vec<Option<JobResult>>,
    pub counts: HandleCounts,
    pub cancelled: bool,
}

/// Resolve every job with a bounded worker pool.
///
/// Cancellation stops new jobs from being issued; jobs already in flight
/// drain and still contribute their results.
pub async fn resolve_all(
    store: Arc<dyn ObjectStore>,
    jobs: Vec<HandleJob>,
    opts: SignOptions,
    cancel: CancellationToken,
) -> BulkOutcome {
    let total = jobs.len();
    let semaphore = Arc::new(Semaphore::new(opts.max_in_flight.max(1)));
    let counters = Arc::new(HandleCounters::default());
    let mut results: Vec<Option<JobResult>> = vec![None; total];
    let mut workers: JoinSet<(usize, JobResult)> = JoinSet::new();
    let mut cancelled = false;

    for (idx, job) in jobs.into_iter().enumerate() {
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                cancelled = true;
                break;
            }
            permit = Arc::clone(&semaphore).acquire_owned() => {
                // The semaphore is never closed while the pass runs.
                permit.unwrap_or_else(|_| unreachable!("signing semaphore closed"))
            }
        };

        let store = Arc::clone(&store);
        let opts = opts.clone();
        let counters = Arc::clone(&counters);
        workers.spawn(async move {
            let _permit = permit;
            let video = match &job.video {
                Some(request) => {
                    let (handle, outcome) = resolve_handle(store.as_ref(), request, &opts).await;
                    counters.record(outcome);
                    Some((handle, outcome))
                }
                None => None,
            };
            let thumbnail = match &job.thumbnail {
                Some(request) => Some(resolve_handle(store.as_ref(), request, &opts).await.0),
                None => None,
            };
            (idx, JobResult { video, thumbnail })
        });
    }

    // Drain in-flight work; completion order is irrelevant because results
    // are written back by input index.
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((idx, result)) => results[idx] = Some(result),
            Err(err) => log::warn!("signing worker panicked: {err}"),
        }
    }

    let counts = counters.snapshot();
    if cancelled {
        let issued = results.iter().filter(|slot| slot.is_some()).count();
        log::info!("signing pass cancelled after {issued}/{total} jobs");
    }
    BulkOutcome {
        results,
        counts,
        cancelled,
    }
}

use crate::error::ObjectStoreError;
use crate::object_store::ObjectStore;
use std::collections::HashSet;
use std::time::Duration;
use storysync_model::{HandleErrorKind, ResourceHandle};

/// Query-parameter names that mark a URL as carrying one of the two
/// supported signing schemes (version-4 expiry, access-key id, or a bare
/// signature parameter).
pub const SIGNATURE_MARKERS: [&str; 3] = ["X-Amz-Expires", "AWSAccessKeyId", "Signature"];

/// Legacy snapshots stored signer failures as the URL itself.
const LEGACY_ERROR_PREFIX: &str = "ERROR:";

/// Knobs for handle resolution. `max_in_flight` only matters for the bulk
/// variant.
#[derive(Debug, Clone)]
pub struct SignOptions {
    /// Regenerate even when the existing handle looks reusable.
    pub force: bool,
    /// Upper bound on each exists/sign call; elapsing is a transient error.
    pub request_timeout: Duration,
    /// Drop raw signer messages instead of attaching them to the handle.
    pub suppress_errors: bool,
    /// Worker-pool bound for bulk resolution.
    pub max_in_flight: usize,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            force: false,
            request_timeout: Duration::from_secs(30),
            suppress_errors: true,
            max_in_flight: 8,
        }
    }
}

/// One handle to resolve: the object key plus whatever the previous run left
/// behind for it.
#[derive(Debug, Clone)]
pub struct SignRequest {
    pub key: String,
    pub existing: Option<ResourceHandle>,
    pub ttl_secs: u64,
}

/// Outcome class of a single resolution, mirrored into the run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Generated,
    Reused,
    Missing,
    Errored,
}

/// Structural reusability of a signed URL.
///
/// The check is deliberately not temporal: a URL qualifies when its query
/// string carries at least one recognized signature marker, without
/// inspecting expiry or cryptographic validity.
pub fn url_is_reusable(url: &str) -> bool {
    if url.is_empty() || url.starts_with(LEGACY_ERROR_PREFIX) {
        return false;
    }
    let Some((_, query)) = url.split_once('?') else {
        return false;
    };
    let keys: HashSet<&str> = query
        .split('&')
        .map(|pair| pair.split('=').next().unwrap_or(pair))
        .collect();
    SIGNATURE_MARKERS.iter().any(|marker| keys.contains(marker))
}

/// Whether an existing handle can be reused as-is.
pub fn handle_is_reusable(handle: &ResourceHandle) -> bool {
    handle.error == HandleErrorKind::None
        && handle.url.as_deref().map(url_is_reusable).unwrap_or(false)
}

/// Resolve one handle: reuse the existing one when structurally valid,
/// otherwise ask the store for a fresh signed URL and classify the outcome.
///
/// Never returns an error; failures are recorded on the handle itself.
pub async fn resolve_handle(
    store: &dyn ObjectStore,
    request: &SignRequest,
    opts: &SignOptions,
) -> (ResourceHandle, ResolveOutcome) {
    if !opts.force {
        if let Some(existing) = &request.existing {
            if handle_is_reusable(existing) {
                log::debug!("reusing handle for {}", request.key);
                return (existing.clone(), ResolveOutcome::Reused);
            }
        }
    }

    match bounded(store.exists(&request.key), opts.request_timeout).await {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) | Ok(Err(ObjectStoreError::NotFound(_))) => {
            log::debug!("object missing: {}", request.key);
            return (missing_handle(request, opts), ResolveOutcome::Missing);
        }
        Ok(Err(err)) => {
            log::warn!("existence check failed for {}: {err}", request.key);
            return (
                transient_handle(request, opts, &err.to_string()),
                ResolveOutcome::Errored,
            );
        }
        Err(_) => {
            return (
                transient_handle(request, opts, "existence check timed out"),
                ResolveOutcome::Errored,
            );
        }
    }

    match bounded(store.sign(&request.key, request.ttl_secs), opts.request_timeout).await {
        Ok(Ok(url)) => {
            let handle = ResourceHandle {
                key: request.key.clone(),
                url: Some(url),
                generated_at: Some(chrono::Utc::now()),
                error: HandleErrorKind::None,
                error_message: None,
            };
            (handle, ResolveOutcome::Generated)
        }
        Ok(Err(ObjectStoreError::NotFound(_))) => {
            (missing_handle(request, opts), ResolveOutcome::Missing)
        }
        Ok(Err(err)) => {
            log::warn!("signing failed for {}: {err}", request.key);
            (
                transient_handle(request, opts, &err.to_string()),
                ResolveOutcome::Errored,
            )
        }
        Err(_) => (
            transient_handle(request, opts, "signing timed out"),
            ResolveOutcome::Errored,
        ),
    }
}

async fn bounded<F, T>(fut: F, timeout: Duration) -> std::result::Result<T, tokio::time::error::Elapsed>
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(timeout, fut).await
}

fn missing_handle(request: &SignRequest, opts: &SignOptions) -> ResourceHandle {
    ResourceHandle {
        key: request.key.clone(),
        url: None,
        generated_at: None,
        error: HandleErrorKind::NotFound,
        error_message: (!opts.suppress_errors).then(|| format!("object not found: {}", request.key)),
    }
}

fn transient_handle(request: &SignRequest, opts: &SignOptions, message: &str) -> ResourceHandle {
    ResourceHandle {
        key: request.key.clone(),
        url: None,
        generated_at: None,
        error: HandleErrorKind::TransientError,
        error_message: (!opts.suppress_errors).then(|| message.to_string()),
    }
}

use crate::error::Result;
use async_trait::async_trait;

/// External media store: existence checks and signed-URL generation.
///
/// Adapters for the real store live outside this workspace; tests use
/// in-memory doubles. Implementations are not expected to retry; outcome
/// classification is the caller's job.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether the object behind `key` exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Produce a time-limited signed URL for `key`.
    async fn sign(&self, key: &str, ttl_secs: u64) -> Result<String>;
}

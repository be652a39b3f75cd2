use async_trait::async_trait;
use std::path::PathBuf;
use storysync_store::{ObjectStore, ObjectStoreError, Result};

/// Object store backed by a local media directory (the demo-asset layout).
///
/// "Signing" emits a `file://` URL carrying the same structural markers a
/// real signer would, so downstream reuse checks behave identically. Real
/// cloud adapters live outside this workspace.
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalDirStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(ObjectStoreError::Unknown(format!(
                "stat {}: {err}",
                path.display()
            ))),
        }
    }

    async fn sign(&self, key: &str, ttl_secs: u64) -> Result<String> {
        let path = self.object_path(key);
        if !self.exists(key).await? {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        Ok(format!(
            "file://{}?X-Amz-Expires={ttl_secs}&Signature=local",
            path.display()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storysync_store::url_is_reusable;

    #[tokio::test]
    async fn signs_existing_files_with_reusable_urls() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("clips")).expect("mkdir");
        std::fs::write(dir.path().join("clips/a.mp4"), b"video").expect("write");

        let store = LocalDirStore::new(dir.path());
        assert!(store.exists("clips/a.mp4").await.expect("exists"));
        let url = store.sign("clips/a.mp4", 600).await.expect("sign");
        assert!(url_is_reusable(&url));
    }

    #[tokio::test]
    async fn missing_files_are_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalDirStore::new(dir.path());
        assert!(!store.exists("clips/gone.mp4").await.expect("exists"));
        let err = store.sign("clips/gone.mp4", 600).await.unwrap_err();
        assert!(matches!(err, ObjectStoreError::NotFound(_)));
    }
}

//! Storage seam for image files backing posts.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("stored reference `{0}` is not a valid path")]
    InvalidRef(String),
    #[error("file payload is empty")]
    EmptyPayload,
    #[error("file storage failed: {0}")]
    Storage(String),
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `data` and return the reference clients use to fetch it.
    async fn store(&self, suggested_name: &str, data: Bytes) -> Result<String, FileStoreError>;

    /// Remove a stored file. Unknown references are not an error.
    async fn release(&self, stored_ref: &str) -> Result<(), FileStoreError>;
}

/// Release a file without failing the surrounding operation.
///
/// The data change that orphaned the file has already committed, so a failure
/// here is only logged and counted.
pub async fn release_detached(store: &dyn FileStore, stored_ref: &str, operation: &'static str) {
    if let Err(err) = store.release(stored_ref).await {
        metrics::counter!("postline_image_release_failures_total").increment(1);
        warn!(
            target = "postline::files",
            operation,
            stored_ref,
            error = %err,
            "failed to release stored image"
        );
    }
}

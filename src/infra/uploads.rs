//! Filesystem storage for post images.
//!
//! Stored references carry the public `images/` prefix so clients can use
//! them directly as relative URLs.

use std::error::Error as StdError;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, pin_mut, stream};
use sha2::{Digest, Sha256};
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;
use uuid::Uuid;

use crate::application::files::{FileStore, FileStoreError};

/// Prefix shared by stored references and the route that serves them.
pub const PUBLIC_PREFIX: &str = "images";

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded image stream failed")]
    PayloadStream {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("uploaded image is empty")]
    EmptyPayload,
}

impl UploadStorageError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::InvalidPath => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<UploadStorageError> for FileStoreError {
    fn from(err: UploadStorageError) -> Self {
        match err {
            UploadStorageError::InvalidPath => FileStoreError::InvalidRef(err.to_string()),
            UploadStorageError::EmptyPayload => FileStoreError::EmptyPayload,
            other => FileStoreError::Storage(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub stored_ref: String,
    pub checksum: String,
    pub size_bytes: u64,
}

#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Root the store at `root`, creating the directory when missing.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Stream an image to disk under a fresh dated name.
    ///
    /// A failed or empty stream leaves no partial file behind.
    pub async fn store_stream<S>(
        &self,
        original_name: &str,
        stream: S,
    ) -> Result<StoredImage, UploadStorageError>
    where
        S: futures::Stream<Item = Result<Bytes, UploadStorageError>>,
    {
        let relative = build_relative_path(original_name);
        let absolute = self.root.join(&relative);

        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        let mut hasher = Sha256::new();
        let mut size_bytes: u64 = 0;

        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    drop(file);
                    let _ = fs::remove_file(&absolute).await;
                    return Err(err);
                }
            };
            if chunk.is_empty() {
                continue;
            }
            size_bytes += chunk.len() as u64;
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
        }

        file.flush().await?;

        if size_bytes == 0 {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(UploadStorageError::EmptyPayload);
        }

        let stored = StoredImage {
            stored_ref: format!("{PUBLIC_PREFIX}/{relative}"),
            checksum: hex::encode(hasher.finalize()),
            size_bytes,
        };
        debug!(
            target = "postline::uploads",
            stored_ref = %stored.stored_ref,
            checksum = %stored.checksum,
            size_bytes,
            "image stored"
        );
        Ok(stored)
    }

    pub async fn read(&self, stored_ref: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_ref)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove a stored image. Missing files count as removed.
    pub async fn delete(&self, stored_ref: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(stored_ref)?;
        match fs::remove_file(&absolute).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    /// Map a stored reference (with or without the public prefix) to a path
    /// under the root, refusing anything that could escape it.
    fn resolve(&self, stored_ref: &str) -> Result<PathBuf, UploadStorageError> {
        let trimmed = stored_ref.trim();
        let relative = trimmed
            .strip_prefix('/')
            .unwrap_or(trimmed)
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(trimmed);

        let path = Path::new(relative);
        if relative.is_empty()
            || path.is_absolute()
            || path
                .components()
                .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(path))
    }
}

#[async_trait]
impl FileStore for UploadStorage {
    async fn store(&self, suggested_name: &str, data: Bytes) -> Result<String, FileStoreError> {
        let payload = stream::once(async move { Ok::<_, UploadStorageError>(data) });
        let stored = self.store_stream(suggested_name, payload).await?;
        Ok(stored.stored_ref)
    }

    async fn release(&self, stored_ref: &str) -> Result<(), FileStoreError> {
        self.delete(stored_ref).await.map_err(FileStoreError::from)
    }
}

fn build_relative_path(original_name: &str) -> String {
    let (year, month, day) = time::OffsetDateTime::now_utc().to_calendar_date();
    format!(
        "{year}/{:02}/{day:02}/{}-{}",
        month as u8,
        Uuid::new_v4(),
        sanitize_filename(original_name)
    )
}

fn sanitize_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .map(slugify)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "image".to_string());

    match path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|value| !value.is_empty())
    {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, UploadStorage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().join("images")).expect("storage");
        (dir, storage)
    }

    #[tokio::test]
    async fn stored_reference_is_public_and_readable() {
        let (_dir, storage) = storage();
        let stored_ref = FileStore::store(&storage, "My Cat.PNG", Bytes::from_static(b"png"))
            .await
            .expect("store");

        assert!(stored_ref.starts_with("images/"));
        assert!(stored_ref.ends_with("-my-cat.png"));
        assert_eq!(storage.read(&stored_ref).await.expect("read"), "png");
    }

    #[tokio::test]
    async fn release_removes_file_and_tolerates_repeats() {
        let (_dir, storage) = storage();
        let stored_ref = FileStore::store(&storage, "a.jpg", Bytes::from_static(b"jpg"))
            .await
            .expect("store");

        storage.release(&stored_ref).await.expect("first release");
        storage.release(&stored_ref).await.expect("second release");
        assert!(storage.read(&stored_ref).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let (_dir, storage) = storage();
        let result = FileStore::store(&storage, "a.png", Bytes::new()).await;
        assert!(matches!(result, Err(FileStoreError::EmptyPayload)));
    }

    #[tokio::test]
    async fn traversal_is_refused() {
        let (_dir, storage) = storage();
        for candidate in ["../secret", "images/../../etc/passwd", "/etc/passwd", ""] {
            assert!(matches!(
                storage.delete(candidate).await,
                Err(UploadStorageError::InvalidPath)
            ));
        }
    }

    #[test]
    fn sanitized_names_fall_back_when_stem_is_unusable() {
        assert_eq!(sanitize_filename("***.JPEG"), "image.jpeg");
        assert_eq!(sanitize_filename("Holiday Photo.png"), "holiday-photo.png");
    }
}

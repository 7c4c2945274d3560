//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::PageWindow;
use crate::domain::accounts::AccountRecord;
use crate::domain::posts::{ImageUpdate, PostRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub content: String,
    pub image_ref: Option<String>,
    pub creator_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image: ImageUpdate,
}

/// Outcome of a post update. `orphaned_image` is the image the row held
/// before the update, present only when no post references it any more.
#[derive(Debug, Clone)]
pub struct UpdatedPost {
    pub post: PostRecord,
    pub orphaned_image: Option<String>,
}

/// Outcome of a post removal. `orphaned_image` is the deleted row's image,
/// present only when no remaining post references it.
#[derive(Debug, Clone, Default)]
pub struct DeletedPost {
    pub orphaned_image: Option<String>,
}

#[async_trait]
pub trait AccountsRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<AccountRecord>, RepoError>;

    /// Load every account whose id appears in `ids`. Unknown ids are skipped.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<AccountRecord>, RepoError>;

    /// Insert a new account with an empty post list.
    ///
    /// A taken email surfaces as [`RepoError::Duplicate`].
    async fn create_account(&self, params: CreateAccountParams)
    -> Result<AccountRecord, RepoError>;

    /// Overwrite the status line. Returns `None` when the account is gone.
    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> Result<Option<AccountRecord>, RepoError>;

    /// Recompute every account's post list from post ownership, returning the
    /// number of accounts whose list changed.
    async fn rebuild_post_lists(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    /// Posts ordered newest first, restricted to the given window.
    async fn list_page(&self, window: PageWindow) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self) -> Result<u64, RepoError>;

    /// Insert the post and append its id to the creator's post list as one
    /// atomic change.
    async fn create_owned(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Overwrite title and content, applying the image update. The previous
    /// image is read under the same row lock as the write. Returns `None`
    /// when the post no longer exists.
    async fn update_post(&self, params: UpdatePostParams)
    -> Result<Option<UpdatedPost>, RepoError>;

    /// Remove the post and pull its id from the creator's post list as one
    /// atomic change. Returns `None` when nothing was deleted.
    async fn delete_owned(
        &self,
        id: Uuid,
        creator_id: Uuid,
    ) -> Result<Option<DeletedPost>, RepoError>;
}

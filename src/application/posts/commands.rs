use tracing::info;
use uuid::Uuid;

use crate::application::auth::AuthContext;
use crate::application::auth::guard::{require_authenticated, require_ownership};
use crate::application::error::ServiceError;
use crate::application::files::release_detached;
use crate::application::repos::{CreatePostParams, UpdatePostParams, UpdatedPost};
use crate::domain::accounts::CreatorView;
use crate::domain::posts::PostWithCreator;
use crate::domain::validation::validate_post_input;

use super::service::PostService;
use super::types::{CreatePostCommand, UpdatePostCommand};

impl PostService {
    pub async fn create(
        &self,
        ctx: &AuthContext,
        command: CreatePostCommand,
    ) -> Result<PostWithCreator, ServiceError> {
        let caller = require_authenticated(ctx)?;
        ServiceError::ensure_valid(validate_post_input(&command.title, &command.content))?;

        let account = self
            .accounts
            .find_by_id(caller.id)
            .await?
            .ok_or(ServiceError::AccountMissing)?;

        let post = self
            .posts
            .create_owned(CreatePostParams {
                title: command.title,
                content: command.content,
                image_ref: command.image_ref.filter(|value| !value.trim().is_empty()),
                creator_id: account.id,
            })
            .await?;

        metrics::counter!("postline_posts_created_total").increment(1);
        info!(
            target = "postline::posts",
            post_id = %post.id,
            creator_id = %account.id,
            "post created"
        );

        Ok(PostWithCreator {
            post,
            creator: CreatorView::from(&account),
        })
    }

    pub async fn update(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        command: UpdatePostCommand,
    ) -> Result<PostWithCreator, ServiceError> {
        let caller = require_authenticated(ctx)?;
        let existing = self.load(id).await?;
        require_ownership(caller, &existing)?;
        ServiceError::ensure_valid(validate_post_input(&command.title, &command.content))?;

        let UpdatedPost {
            post: updated,
            orphaned_image,
        } = self
            .posts
            .update_post(UpdatePostParams {
                id,
                title: command.title,
                content: command.content,
                image: command.image,
            })
            .await?
            .ok_or(ServiceError::not_found("post"))?;

        if let Some(stale) = orphaned_image.as_deref() {
            release_detached(self.files.as_ref(), stale, "post.update").await;
        }

        info!(target = "postline::posts", post_id = %updated.id, "post updated");

        let mut resolved = self.attach_creators(vec![updated]).await?;
        resolved
            .pop()
            .ok_or_else(|| ServiceError::Unexpected("post vanished while resolving".into()))
    }

    pub async fn delete(&self, ctx: &AuthContext, id: Uuid) -> Result<(), ServiceError> {
        let caller = require_authenticated(ctx)?;
        let existing = self.load(id).await?;
        require_ownership(caller, &existing.creator_id)?;

        let deleted = self
            .posts
            .delete_owned(id, existing.creator_id)
            .await?
            .ok_or(ServiceError::not_found("post"))?;

        // Shared images stay until the last post referencing them is gone.
        if let Some(image_ref) = deleted.orphaned_image.as_deref() {
            release_detached(self.files.as_ref(), image_ref, "post.delete").await;
        }

        metrics::counter!("postline_posts_deleted_total").increment(1);
        info!(
            target = "postline::posts",
            post_id = %id,
            creator_id = %existing.creator_id,
            "post deleted"
        );

        Ok(())
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::ServiceError;
use crate::application::files::FileStore;
use crate::application::pagination::DEFAULT_PAGE_SIZE;
use crate::application::repos::{AccountsRepo, PostsRepo};
use crate::domain::accounts::CreatorView;
use crate::domain::posts::{PostRecord, PostWithCreator};

#[derive(Clone)]
pub struct PostService {
    pub(crate) posts: Arc<dyn PostsRepo>,
    pub(crate) accounts: Arc<dyn AccountsRepo>,
    pub(crate) files: Arc<dyn FileStore>,
    pub(crate) page_size: u32,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        accounts: Arc<dyn AccountsRepo>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            posts,
            accounts,
            files,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub(crate) async fn load(&self, id: Uuid) -> Result<PostRecord, ServiceError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::not_found("post"))
    }

    /// Resolve creators for a batch of posts with a single account lookup.
    pub(crate) async fn attach_creators(
        &self,
        posts: Vec<PostRecord>,
    ) -> Result<Vec<PostWithCreator>, ServiceError> {
        let mut ids: Vec<Uuid> = posts.iter().map(|post| post.creator_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let creators: HashMap<Uuid, CreatorView> = self
            .accounts
            .find_many(&ids)
            .await?
            .iter()
            .map(|account| (account.id, CreatorView::from(account)))
            .collect();

        posts
            .into_iter()
            .map(|post| {
                let creator = creators.get(&post.creator_id).cloned().ok_or_else(|| {
                    ServiceError::Unexpected(format!(
                        "creator {} of post {} is missing",
                        post.creator_id, post.id
                    ))
                })?;
                Ok(PostWithCreator { post, creator })
            })
            .collect()
    }
}

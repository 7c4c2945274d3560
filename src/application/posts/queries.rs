use uuid::Uuid;

use crate::application::auth::AuthContext;
use crate::application::auth::guard::require_authenticated;
use crate::application::error::ServiceError;
use crate::application::pagination::{PageWindow, PostPage};
use crate::domain::posts::PostWithCreator;

use super::service::PostService;

impl PostService {
    /// One page of the global feed, newest first.
    pub async fn list(&self, ctx: &AuthContext, page: Option<u32>) -> Result<PostPage, ServiceError> {
        require_authenticated(ctx)?;

        let window = PageWindow::for_page(page, self.page_size);
        let total_posts = self.posts.count_posts().await?;
        let records = self.posts.list_page(window).await?;
        let posts = self.attach_creators(records).await?;

        Ok(PostPage { posts, total_posts })
    }

    pub async fn get_by_id(
        &self,
        ctx: &AuthContext,
        id: Uuid,
    ) -> Result<PostWithCreator, ServiceError> {
        require_authenticated(ctx)?;

        let post = self.load(id).await?;
        let mut resolved = self.attach_creators(vec![post]).await?;
        resolved
            .pop()
            .ok_or_else(|| ServiceError::Unexpected("post vanished while resolving".into()))
    }
}

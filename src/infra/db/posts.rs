use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PageWindow;
use crate::application::repos::{
    CreatePostParams, DeletedPost, PostsRepo, RepoError, UpdatePostParams, UpdatedPost,
};
use crate::domain::posts::{ImageUpdate, PostRecord};

use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str = "id, title, content, image_ref, creator_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
    image_ref: Option<String>,
    creator_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            image_ref: row.image_ref,
            creator_id: row.creator_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn list_page(&self, window: PageWindow) -> Result<Vec<PostRecord>, RepoError> {
        let offset = i64::try_from(window.offset).map_err(|_| RepoError::InvalidInput {
            message: "page offset exceeds supported range".to_string(),
        })?;

        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(i64::from(window.limit))
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self) -> Result<u64, RepoError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn create_owned(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            title,
            content,
            image_ref,
            creator_id,
        } = params;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let sql = format!(
            "INSERT INTO posts (id, title, content, image_ref, creator_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(title)
            .bind(content)
            .bind(image_ref)
            .bind(creator_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let appended = sqlx::query(
            "UPDATE accounts SET post_ids = array_append(post_ids, $1), updated_at = now() \
             WHERE id = $2",
        )
        .bind(row.id)
        .bind(creator_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if appended.rows_affected() != 1 {
            return Err(RepoError::integrity(format!(
                "creator {creator_id} disappeared while creating a post"
            )));
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(PostRecord::from(row))
    }

    async fn update_post(
        &self,
        params: UpdatePostParams,
    ) -> Result<Option<UpdatedPost>, RepoError> {
        let UpdatePostParams {
            id,
            title,
            content,
            image,
        } = params;

        let (replace_image, image_ref) = match image {
            ImageUpdate::Keep => (false, None),
            ImageUpdate::Replace(next) => (true, next),
        };

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // Concurrent updates of one post serialize here, so each sees the
        // image the other left behind.
        let previous = sqlx::query_scalar::<_, Option<String>>(
            "SELECT image_ref FROM posts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let Some(previous) = previous else {
            return Ok(None);
        };

        let sql = format!(
            "UPDATE posts SET title = $2, content = $3, \
             image_ref = CASE WHEN $4 THEN $5 ELSE image_ref END, \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(title)
            .bind(content)
            .bind(replace_image)
            .bind(image_ref)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let orphaned_image = match previous {
            Some(previous) if row.image_ref.as_deref() != Some(previous.as_str()) => {
                unreferenced(&mut tx, previous).await?
            }
            _ => None,
        };

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(Some(UpdatedPost {
            post: PostRecord::from(row),
            orphaned_image,
        }))
    }

    async fn delete_owned(
        &self,
        id: Uuid,
        creator_id: Uuid,
    ) -> Result<Option<DeletedPost>, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let deleted = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM posts WHERE id = $1 AND creator_id = $2 RETURNING image_ref",
        )
        .bind(id)
        .bind(creator_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let Some(image_ref) = deleted else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE accounts SET post_ids = array_remove(post_ids, $1), updated_at = now() \
             WHERE id = $2",
        )
        .bind(id)
        .bind(creator_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let orphaned_image = match image_ref {
            Some(image_ref) => unreferenced(&mut tx, image_ref).await?,
            None => None,
        };

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(Some(DeletedPost { orphaned_image }))
    }
}

/// `Some(image_ref)` when no post row references the image any more.
async fn unreferenced(
    tx: &mut Transaction<'_, Postgres>,
    image_ref: String,
) -> Result<Option<String>, RepoError> {
    let in_use = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM posts WHERE image_ref = $1)",
    )
    .bind(&image_ref)
    .fetch_one(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;

    Ok((!in_use).then_some(image_ref))
}

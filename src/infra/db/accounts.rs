use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AccountsRepo, CreateAccountParams, RepoError};
use crate::domain::accounts::AccountRecord;

use super::{PostgresRepositories, map_sqlx_error};

const ACCOUNT_COLUMNS: &str =
    "id, email, name, password_hash, status, post_ids, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    status: String,
    post_ids: Vec<Uuid>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AccountRow> for AccountRecord {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            status: row.status,
            post_ids: row.post_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AccountsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>, RepoError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(AccountRecord::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AccountRecord>, RepoError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(AccountRecord::from))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<AccountRecord>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AccountRecord::from).collect())
    }

    async fn create_account(
        &self,
        params: CreateAccountParams,
    ) -> Result<AccountRecord, RepoError> {
        let CreateAccountParams {
            email,
            name,
            password_hash,
            status,
        } = params;

        let sql = format!(
            "INSERT INTO accounts (id, email, name, password_hash, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .bind(status)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(AccountRecord::from(row))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> Result<Option<AccountRecord>, RepoError> {
        let sql = format!(
            "UPDATE accounts SET status = $2, updated_at = now() WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(AccountRecord::from))
    }

    async fn rebuild_post_lists(&self) -> Result<u64, RepoError> {
        let result = sqlx::query(
            r#"
            WITH rebuilt AS (
                SELECT a.id,
                       COALESCE(
                           array_agg(p.id ORDER BY p.created_at, p.id)
                               FILTER (WHERE p.id IS NOT NULL),
                           '{}'::uuid[]
                       ) AS post_ids
                FROM accounts a
                LEFT JOIN posts p ON p.creator_id = a.id
                GROUP BY a.id
            )
            UPDATE accounts
            SET post_ids = rebuilt.post_ids, updated_at = now()
            FROM rebuilt
            WHERE accounts.id = rebuilt.id
              AND accounts.post_ids IS DISTINCT FROM rebuilt.post_ids
            "#,
        )
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

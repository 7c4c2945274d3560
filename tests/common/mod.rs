#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use postline::application::accounts::{AccountService, RegisterCommand};
use postline::application::auth::{AuthContext, CredentialCodec, CredentialVerifier};
use postline::application::files::{FileStore, FileStoreError};
use postline::application::pagination::PageWindow;
use postline::application::posts::PostService;
use postline::application::repos::{
    AccountsRepo, CreateAccountParams, CreatePostParams, DeletedPost, PostsRepo, RepoError,
    UpdatePostParams, UpdatedPost,
};
use postline::application::status::StatusService;
use postline::domain::accounts::AccountRecord;
use postline::domain::posts::{ImageUpdate, PostRecord};
use postline::infra::security::{Argon2Scheme, JwtCodec};

pub const TOKEN_SECRET: &[u8] = b"integration-test-secret-0123456789";

#[derive(Default)]
struct Tables {
    accounts: Vec<AccountRecord>,
    posts: Vec<PostRecord>,
    ticks: i64,
}

impl Tables {
    /// Strictly increasing timestamps keep feed ordering deterministic.
    fn now(&mut self) -> OffsetDateTime {
        self.ticks += 1;
        OffsetDateTime::UNIX_EPOCH + Duration::days(19_000) + Duration::seconds(self.ticks)
    }

    fn image_in_use(&self, image_ref: &str) -> bool {
        self.posts
            .iter()
            .any(|p| p.image_ref.as_deref() == Some(image_ref))
    }
}

/// Accounts and posts held in one lock, so paired writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn account(&self, id: Uuid) -> Option<AccountRecord> {
        let tables = self.tables.lock().unwrap();
        tables.accounts.iter().find(|a| a.id == id).cloned()
    }

    pub fn post(&self, id: Uuid) -> Option<PostRecord> {
        let tables = self.tables.lock().unwrap();
        tables.posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn account_count(&self) -> usize {
        self.tables.lock().unwrap().accounts.len()
    }

    /// Simulate drift left behind by an interrupted write.
    pub fn overwrite_post_ids(&self, id: Uuid, post_ids: Vec<Uuid>) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(account) = tables.accounts.iter_mut().find(|a| a.id == id) {
            account.post_ids = post_ids;
        }
    }
}

#[async_trait]
impl AccountsRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>, RepoError> {
        Ok(self.account(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AccountRecord>, RepoError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<AccountRecord>, RepoError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .accounts
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn create_account(
        &self,
        params: CreateAccountParams,
    ) -> Result<AccountRecord, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.accounts.iter().any(|a| a.email == params.email) {
            return Err(RepoError::Duplicate {
                constraint: "accounts_email_key".into(),
            });
        }
        let now = tables.now();
        let record = AccountRecord {
            id: Uuid::new_v4(),
            email: params.email,
            name: params.name,
            password_hash: params.password_hash,
            status: params.status,
            post_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.accounts.push(record.clone());
        Ok(record)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> Result<Option<AccountRecord>, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let now = tables.now();
        Ok(tables
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .map(|account| {
                account.status = status.to_string();
                account.updated_at = now;
                account.clone()
            }))
    }

    async fn rebuild_post_lists(&self) -> Result<u64, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let mut posts = tables.posts.clone();
        posts.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        let mut changed = 0;
        for account in tables.accounts.iter_mut() {
            let rebuilt: Vec<Uuid> = posts
                .iter()
                .filter(|p| p.creator_id == account.id)
                .map(|p| p.id)
                .collect();
            if account.post_ids != rebuilt {
                account.post_ids = rebuilt;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.post(id))
    }

    async fn list_page(&self, window: PageWindow) -> Result<Vec<PostRecord>, RepoError> {
        let tables = self.tables.lock().unwrap();
        let mut posts = tables.posts.clone();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(posts
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect())
    }

    async fn count_posts(&self) -> Result<u64, RepoError> {
        Ok(self.tables.lock().unwrap().posts.len() as u64)
    }

    async fn create_owned(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let now = tables.now();
        let record = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            content: params.content,
            image_ref: params.image_ref,
            creator_id: params.creator_id,
            created_at: now,
            updated_at: now,
        };
        let owner = tables
            .accounts
            .iter_mut()
            .find(|a| a.id == params.creator_id)
            .ok_or_else(|| RepoError::integrity("creator missing"))?;
        owner.post_ids.push(record.id);
        tables.posts.push(record.clone());
        Ok(record)
    }

    async fn update_post(
        &self,
        params: UpdatePostParams,
    ) -> Result<Option<UpdatedPost>, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let now = tables.now();
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == params.id) else {
            return Ok(None);
        };

        let previous = post.image_ref.clone();
        post.title = params.title;
        post.content = params.content;
        if let ImageUpdate::Replace(next) = params.image {
            post.image_ref = next;
        }
        post.updated_at = now;
        let post = post.clone();

        let orphaned_image = previous
            .filter(|previous| post.image_ref.as_deref() != Some(previous.as_str()))
            .filter(|previous| !tables.image_in_use(previous));
        Ok(Some(UpdatedPost {
            post,
            orphaned_image,
        }))
    }

    async fn delete_owned(
        &self,
        id: Uuid,
        creator_id: Uuid,
    ) -> Result<Option<DeletedPost>, RepoError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(index) = tables
            .posts
            .iter()
            .position(|p| p.id == id && p.creator_id == creator_id)
        else {
            return Ok(None);
        };

        let removed = tables.posts.remove(index);
        if let Some(owner) = tables.accounts.iter_mut().find(|a| a.id == creator_id) {
            owner.post_ids.retain(|post_id| *post_id != id);
        }

        let orphaned_image = removed
            .image_ref
            .filter(|image_ref| !tables.image_in_use(image_ref));
        Ok(Some(DeletedPost { orphaned_image }))
    }
}

/// File store that remembers what was stored and released.
#[derive(Default)]
pub struct RecordingFiles {
    pub stored: Mutex<Vec<String>>,
    pub released: Mutex<Vec<String>>,
    pub fail_releases: bool,
}

impl RecordingFiles {
    pub fn failing() -> Self {
        Self {
            fail_releases: true,
            ..Self::default()
        }
    }

    pub fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for RecordingFiles {
    async fn store(&self, suggested_name: &str, _data: Bytes) -> Result<String, FileStoreError> {
        let stored_ref = format!("images/{}-{suggested_name}", Uuid::new_v4());
        self.stored.lock().unwrap().push(stored_ref.clone());
        Ok(stored_ref)
    }

    async fn release(&self, stored_ref: &str) -> Result<(), FileStoreError> {
        if self.fail_releases {
            return Err(FileStoreError::Storage("disk unavailable".into()));
        }
        self.released.lock().unwrap().push(stored_ref.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub files: Arc<RecordingFiles>,
    pub codec: Arc<dyn CredentialCodec>,
    pub accounts: AccountService,
    pub posts: PostService,
    pub status: StatusService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_files(RecordingFiles::default())
    }

    pub fn with_files(files: RecordingFiles) -> Self {
        let store = Arc::new(MemoryStore::default());
        let files = Arc::new(files);
        let codec: Arc<dyn CredentialCodec> = Arc::new(JwtCodec::from_secret(TOKEN_SECRET));
        let passwords = Arc::new(Argon2Scheme::with_params(8 * 1024, 1, 1).expect("params"));

        let accounts = AccountService::new(
            store.clone(),
            passwords,
            codec.clone(),
            Duration::hours(1),
        );
        let posts = PostService::new(store.clone(), store.clone(), files.clone());
        let status = StatusService::new(store.clone());

        Self {
            store,
            files,
            codec,
            accounts,
            posts,
            status,
        }
    }

    pub fn verifier(&self) -> CredentialVerifier {
        CredentialVerifier::new(self.codec.clone())
    }

    /// Register an account and return an authenticated context for it.
    pub async fn signed_up(&self, email: &str) -> AuthContext {
        let account = self
            .accounts
            .register(RegisterCommand {
                email: email.to_string(),
                name: email.split('@').next().unwrap_or("user").to_string(),
                password: "secret-pass".to_string(),
            })
            .await
            .expect("register");
        AuthContext::authenticated(account.id, account.email)
    }
}

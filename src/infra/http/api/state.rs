use std::sync::Arc;

use crate::application::accounts::AccountService;
use crate::application::auth::CredentialVerifier;
use crate::application::posts::PostService;
use crate::application::status::StatusService;
use crate::infra::uploads::UploadStorage;

#[derive(Clone)]
pub struct ApiState {
    pub accounts: Arc<AccountService>,
    pub posts: Arc<PostService>,
    pub status: Arc<StatusService>,
    pub verifier: CredentialVerifier,
    pub upload_storage: Arc<UploadStorage>,
}

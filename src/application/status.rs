use std::sync::Arc;

use tracing::info;

use crate::application::auth::AuthContext;
use crate::application::auth::guard::require_authenticated;
use crate::application::error::ServiceError;
use crate::application::repos::AccountsRepo;
use crate::domain::accounts::AccountView;

/// Reads and rewrites the caller's own status line.
#[derive(Clone)]
pub struct StatusService {
    accounts: Arc<dyn AccountsRepo>,
}

impl StatusService {
    pub fn new(accounts: Arc<dyn AccountsRepo>) -> Self {
        Self { accounts }
    }

    pub async fn current_user(&self, ctx: &AuthContext) -> Result<AccountView, ServiceError> {
        let caller = require_authenticated(ctx)?;
        let account = self
            .accounts
            .find_by_id(caller.id)
            .await?
            .ok_or(ServiceError::not_found("user"))?;
        Ok(AccountView::from(account))
    }

    /// Any text is accepted, including an empty string.
    pub async fn update_status(
        &self,
        ctx: &AuthContext,
        status: &str,
    ) -> Result<AccountView, ServiceError> {
        let caller = require_authenticated(ctx)?;
        self.accounts
            .find_by_id(caller.id)
            .await?
            .ok_or(ServiceError::not_found("user"))?;

        let updated = self
            .accounts
            .update_status(caller.id, status)
            .await?
            .ok_or(ServiceError::not_found("user"))?;

        info!(
            target = "postline::accounts",
            account_id = %updated.id,
            "status updated"
        );
        Ok(AccountView::from(updated))
    }
}

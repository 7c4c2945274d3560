//! Registration and login.

use std::sync::Arc;

use serde::Serialize;
use time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::auth::{CredentialCodec, PasswordError, PasswordScheme};
use crate::application::error::ServiceError;
use crate::application::repos::{AccountsRepo, CreateAccountParams, RepoError};
use crate::domain::accounts::{AccountView, DEFAULT_STATUS};
use crate::domain::validation::validate_credentials;

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub token: String,
    pub user_id: Uuid,
}

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountsRepo>,
    passwords: Arc<dyn PasswordScheme>,
    codec: Arc<dyn CredentialCodec>,
    token_ttl: Duration,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountsRepo>,
        passwords: Arc<dyn PasswordScheme>,
        codec: Arc<dyn CredentialCodec>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            accounts,
            passwords,
            codec,
            token_ttl,
        }
    }

    pub async fn register(&self, command: RegisterCommand) -> Result<AccountView, ServiceError> {
        let RegisterCommand {
            email,
            name,
            password,
        } = command;

        ServiceError::ensure_valid(validate_credentials(&email, &password))?;

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::AlreadyExists);
        }

        let password_hash = self.hash_password(password).await?;

        let record = self
            .accounts
            .create_account(CreateAccountParams {
                email,
                name,
                password_hash,
                status: DEFAULT_STATUS.to_string(),
            })
            .await
            .map_err(|err| match err {
                // Lost a race with a concurrent registration of the same email.
                RepoError::Duplicate { .. } => ServiceError::AlreadyExists,
                other => ServiceError::Repo(other),
            })?;

        metrics::counter!("postline_accounts_registered_total").increment(1);
        info!(
            target = "postline::accounts",
            account_id = %record.id,
            "account registered"
        );

        Ok(AccountView::from(record))
    }

    /// Check the password and issue a signed credential.
    ///
    /// Unknown emails and wrong passwords fail identically. An unknown email
    /// still pays for one hash so response timing does not reveal which
    /// emails are registered.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ServiceError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            self.hash_password(password.to_string()).await?;
            debug!(target = "postline::accounts", "login for unknown email");
            return Err(Self::reject());
        };

        let matches = self
            .verify_password(password.to_string(), account.password_hash.clone())
            .await?;
        if !matches {
            debug!(
                target = "postline::accounts",
                account_id = %account.id,
                "login with wrong password"
            );
            return Err(Self::reject());
        }

        let token = self
            .codec
            .sign(account.id, &account.email, self.token_ttl)?;

        metrics::counter!("postline_logins_total", "outcome" => "success").increment(1);
        info!(
            target = "postline::accounts",
            account_id = %account.id,
            "login succeeded"
        );

        Ok(LoginOutcome {
            token,
            user_id: account.id,
        })
    }

    fn reject() -> ServiceError {
        metrics::counter!("postline_logins_total", "outcome" => "rejected").increment(1);
        ServiceError::InvalidCredentials
    }

    async fn hash_password(&self, password: String) -> Result<String, ServiceError> {
        let scheme = self.passwords.clone();
        let hashed = tokio::task::spawn_blocking(move || scheme.hash(&password))
            .await
            .map_err(|err| PasswordError::Worker(err.to_string()))??;
        Ok(hashed)
    }

    async fn verify_password(
        &self,
        password: String,
        password_hash: String,
    ) -> Result<bool, ServiceError> {
        let scheme = self.passwords.clone();
        let matches = tokio::task::spawn_blocking(move || scheme.verify(&password, &password_hash))
            .await
            .map_err(|err| PasswordError::Worker(err.to_string()))??;
        Ok(matches)
    }
}

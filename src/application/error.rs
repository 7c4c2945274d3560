use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::application::auth::{CredentialError, PasswordError};
use crate::application::repos::RepoError;
use crate::domain::validation::FieldViolation;
use crate::infra::error::InfraError;

/// Diagnostic chain attached to error responses for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Plain-text error for infrastructure endpoints (health checks, static files).
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

/// Failures returned by the account, post and status services.
///
/// The first group are expected outcomes a caller can act on. The rest are
/// unexpected and are reported to clients without detail.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("input validation failed")]
    ValidationFailed(Vec<FieldViolation>),
    #[error("not authenticated")]
    Unauthenticated,
    #[error("account referenced by the credential no longer exists")]
    AccountMissing,
    #[error("caller does not own this resource")]
    Forbidden,
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("account already exists")]
    AlreadyExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    /// Fail with `ValidationFailed` when any rule was violated.
    pub fn ensure_valid(violations: Vec<FieldViolation>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self::ValidationFailed(violations))
        }
    }
}

/// Top-level error for the binary entry points.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_valid_passes_empty_lists() {
        assert!(ServiceError::ensure_valid(Vec::new()).is_ok());
    }

    #[test]
    fn ensure_valid_carries_every_violation() {
        let violations = vec![
            FieldViolation::new("title", "Title is invalid."),
            FieldViolation::new("content", "Content is invalid."),
        ];
        match ServiceError::ensure_valid(violations.clone()) {
            Err(ServiceError::ValidationFailed(found)) => assert_eq!(found, violations),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn report_collects_source_chain() {
        let err = ServiceError::Repo(RepoError::Persistence("pool closed".into()));
        let report = ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &err);
        assert_eq!(report.messages[0], "persistence error: pool closed");
    }
}

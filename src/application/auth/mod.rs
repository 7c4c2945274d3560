//! Caller identity: bearer credentials, password hashing seams, and the
//! per-request authentication context.

pub mod guard;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Duration;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential is malformed")]
    Malformed,
    #[error("credential has expired")]
    Expired,
    #[error("credential signature is invalid")]
    InvalidSignature,
    #[error("failed to sign credential: {0}")]
    Signing(String),
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is unreadable: {0}")]
    StoredHash(String),
    #[error("password worker failed: {0}")]
    Worker(String),
}

/// Claims carried by a signed credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies bearer credentials. Implementations hold no per-request
/// state.
pub trait CredentialCodec: Send + Sync {
    fn sign(&self, caller_id: Uuid, email: &str, ttl: Duration) -> Result<String, CredentialError>;

    fn verify(&self, token: &str) -> Result<Claims, CredentialError>;
}

/// Slow, salted one-way password hashing.
pub trait PasswordScheme: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, PasswordError>;
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub email: String,
}

/// Identity attached to every operation after credential verification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthContext {
    #[default]
    Anonymous,
    Authenticated(Caller),
}

impl AuthContext {
    pub fn authenticated(id: Uuid, email: impl Into<String>) -> Self {
        Self::Authenticated(Caller {
            id,
            email: email.into(),
        })
    }

    pub fn caller(&self) -> Option<&Caller> {
        match self {
            Self::Authenticated(caller) => Some(caller),
            Self::Anonymous => None,
        }
    }
}

/// Turns an optional bearer token into an [`AuthContext`].
///
/// Never fails: any problem with the token downgrades the request to
/// anonymous.
#[derive(Clone)]
pub struct CredentialVerifier {
    codec: Arc<dyn CredentialCodec>,
}

impl CredentialVerifier {
    pub fn new(codec: Arc<dyn CredentialCodec>) -> Self {
        Self { codec }
    }

    pub fn verify(&self, token: Option<&str>) -> AuthContext {
        let Some(token) = token.map(str::trim).filter(|value| !value.is_empty()) else {
            return AuthContext::Anonymous;
        };

        match self.codec.verify(token) {
            Ok(claims) => AuthContext::authenticated(claims.sub, claims.email),
            Err(err) => {
                debug!(
                    target = "postline::auth",
                    reason = %err,
                    "bearer credential rejected"
                );
                AuthContext::Anonymous
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCodec;

    impl CredentialCodec for FixedCodec {
        fn sign(&self, _: Uuid, _: &str, _: Duration) -> Result<String, CredentialError> {
            unreachable!("not used in these tests")
        }

        fn verify(&self, token: &str) -> Result<Claims, CredentialError> {
            match token {
                "good" => Ok(Claims {
                    sub: Uuid::nil(),
                    email: "a@b.io".into(),
                    iat: 0,
                    exp: 0,
                }),
                "expired" => Err(CredentialError::Expired),
                _ => Err(CredentialError::Malformed),
            }
        }
    }

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::new(Arc::new(FixedCodec))
    }

    #[test]
    fn missing_token_is_anonymous() {
        assert_eq!(verifier().verify(None), AuthContext::Anonymous);
        assert_eq!(verifier().verify(Some("  ")), AuthContext::Anonymous);
    }

    #[test]
    fn rejected_tokens_are_anonymous() {
        assert_eq!(verifier().verify(Some("expired")), AuthContext::Anonymous);
        assert_eq!(verifier().verify(Some("garbage")), AuthContext::Anonymous);
    }

    #[test]
    fn valid_token_yields_caller() {
        let ctx = verifier().verify(Some("good"));
        let caller = ctx.caller().expect("authenticated");
        assert_eq!(caller.id, Uuid::nil());
        assert_eq!(caller.email, "a@b.io");
    }
}

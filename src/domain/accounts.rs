//! Account records and their outward-facing projections.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Status line assigned to freshly registered accounts.
pub const DEFAULT_STATUS: &str = "I am new!";

/// Account as persisted, including the password hash.
///
/// `post_ids` is a back-reference maintained alongside post writes. Ownership
/// decisions always use `PostRecord::creator_id` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub status: String,
    pub post_ids: Vec<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Account without credential material, safe to return to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub status: String,
    pub post_ids: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<AccountRecord> for AccountView {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
            status: record.status,
            post_ids: record.post_ids,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Creator details embedded into post responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatorView {
    pub id: Uuid,
    pub name: String,
}

impl From<&AccountRecord> for CreatorView {
    fn from(record: &AccountRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
        }
    }
}

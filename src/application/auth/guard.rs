//! Authentication and ownership checks shared by every service operation.
//!
//! These are decisions over data the caller already loaded; they never touch
//! storage.

use uuid::Uuid;

use super::{AuthContext, Caller};
use crate::application::error::ServiceError;
use crate::domain::posts::PostRecord;

/// Resources with a single authoritative owner.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for PostRecord {
    fn owner_id(&self) -> Uuid {
        self.creator_id
    }
}

impl Owned for Uuid {
    fn owner_id(&self) -> Uuid {
        *self
    }
}

pub fn require_authenticated(ctx: &AuthContext) -> Result<&Caller, ServiceError> {
    ctx.caller().ok_or(ServiceError::Unauthenticated)
}

pub fn require_ownership<R: Owned + ?Sized>(caller: &Caller, resource: &R) -> Result<(), ServiceError> {
    if resource.owner_id() == caller.id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

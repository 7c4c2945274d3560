//! Domain layer types and invariants.

pub mod accounts;
pub mod posts;
pub mod validation;

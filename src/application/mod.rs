//! Application services layer.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod files;
pub mod pagination;
pub mod posts;
pub mod reconcile;
pub mod repos;
pub mod status;

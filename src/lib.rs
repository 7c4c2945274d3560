//! Postline: accounts, bearer authentication, and owner-checked posts with
//! image attachments, served over a JSON HTTP API.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

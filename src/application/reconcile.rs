//! Recovery pass that rebuilds every account's post list from post ownership.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::application::repos::{AccountsRepo, RepoError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub accounts_changed: u64,
}

pub async fn reconcile_post_lists(
    accounts: Arc<dyn AccountsRepo>,
) -> Result<ReconcileReport, RepoError> {
    let started = Instant::now();
    let accounts_changed = accounts.rebuild_post_lists().await?;

    info!(
        target = "postline::reconcile",
        accounts_changed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "post lists reconciled"
    );

    Ok(ReconcileReport { accounts_changed })
}

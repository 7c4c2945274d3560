//! Page-number pagination for the global post listing.

use serde::Serialize;

use crate::domain::posts::PostWithCreator;

pub const DEFAULT_PAGE_SIZE: u32 = 2;

/// Offset/limit pair handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u32,
}

impl PageWindow {
    /// Window for a 1-based page number. A missing or zero page means page 1.
    pub fn for_page(page: Option<u32>, page_size: u32) -> Self {
        let page = page.filter(|value| *value > 0).unwrap_or(1);
        let limit = page_size.max(1);
        Self {
            offset: u64::from(page - 1) * u64::from(limit),
            limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<PostWithCreator>,
    pub total_posts: u64,
}

//! Post records and the "image unchanged" marker used by updates.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::accounts::CreatorView;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_ref: Option<String>,
    pub creator_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A post with its creator resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostWithCreator {
    #[serde(flatten)]
    pub post: PostRecord,
    pub creator: CreatorView,
}

/// How an update treats the image currently attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageUpdate {
    /// Leave the stored image reference untouched.
    #[default]
    Keep,
    /// Point the post at a different stored image (or none).
    Replace(Option<String>),
}

impl ImageUpdate {
    /// Wire value clients send to mean "keep the current image".
    pub const KEEP_MARKER: &'static str = "undefined";

    /// Interpret a raw image field from a request body.
    pub fn from_wire(value: Option<String>) -> Self {
        match value {
            None => Self::Keep,
            Some(raw) if raw == Self::KEEP_MARKER => Self::Keep,
            Some(raw) if raw.trim().is_empty() => Self::Replace(None),
            Some(raw) => Self::Replace(Some(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_marker_and_absence_keep_the_image() {
        assert_eq!(ImageUpdate::from_wire(None), ImageUpdate::Keep);
        assert_eq!(
            ImageUpdate::from_wire(Some("undefined".into())),
            ImageUpdate::Keep
        );
    }

    #[test]
    fn blank_value_clears_the_image() {
        assert_eq!(
            ImageUpdate::from_wire(Some("  ".into())),
            ImageUpdate::Replace(None)
        );
    }

    #[test]
    fn path_replaces_the_image() {
        assert_eq!(
            ImageUpdate::from_wire(Some("2024/01/02/a.png".into())),
            ImageUpdate::Replace(Some("2024/01/02/a.png".into()))
        );
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::posts::{CreatePostCommand, UpdatePostCommand};
use crate::domain::posts::ImageUpdate;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreateRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<PostCreateRequest> for CreatePostCommand {
    fn from(request: PostCreateRequest) -> Self {
        Self {
            title: request.title,
            content: request.content,
            image_ref: request.image_url,
        }
    }
}

/// `imageUrl` may be omitted or set to `"undefined"` to keep the current image.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdateRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<PostUpdateRequest> for UpdatePostCommand {
    fn from(request: PostUpdateRequest) -> Self {
        Self {
            title: request.title,
            content: request.content,
            image: ImageUpdate::from_wire(request.image_url),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeedQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStoredResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Hex SHA-256 of the stored bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

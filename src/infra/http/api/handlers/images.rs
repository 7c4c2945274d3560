//! Image upload for post attachments.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Extension, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::TryStreamExt;
use tracing::debug;

use crate::application::auth::AuthContext;
use crate::application::auth::guard::require_authenticated;
use crate::application::error::ServiceError;
use crate::infra::uploads::UploadStorageError;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::ImageStoredResponse;
use crate::infra::http::api::state::ApiState;

const ACCEPTED_TYPES: [&str; 3] = ["image/png", "image/jpg", "image/jpeg"];

pub async fn upload_image(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = require_authenticated(&ctx)?;
    let mut multipart = multipart?;

    let mut stored = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("Invalid multipart payload.", err.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") if stored.is_none() => {
                let accepted = field
                    .content_type()
                    .is_some_and(|value| ACCEPTED_TYPES.contains(&value));
                if !accepted {
                    continue;
                }

                let filename = field.file_name().unwrap_or("image").to_string();
                let chunks = field.map_err(|err| UploadStorageError::PayloadStream {
                    source: Box::new(err),
                });

                match state.upload_storage.store_stream(&filename, chunks).await {
                    Ok(image) => stored = Some(image),
                    Err(UploadStorageError::EmptyPayload) => {}
                    Err(UploadStorageError::PayloadStream { source }) => {
                        return Err(ApiError::bad_request(
                            "Failed to read uploaded image.",
                            source.to_string(),
                        ));
                    }
                    Err(err) => {
                        return Err(ServiceError::Unexpected(err.to_string()).into());
                    }
                }
            }
            Some("oldPath") => {
                debug!(
                    target = "postline::uploads",
                    caller_id = %caller.id,
                    "ignoring oldPath; images are released by post updates"
                );
            }
            _ => {}
        }
    }

    Ok(match stored {
        Some(image) => (
            StatusCode::CREATED,
            Json(ImageStoredResponse {
                message: "File stored.",
                file_path: Some(image.stored_ref),
                checksum: Some(image.checksum),
                size_bytes: Some(image.size_bytes),
            }),
        ),
        None => (
            StatusCode::OK,
            Json(ImageStoredResponse {
                message: "No file provided!",
                file_path: None,
                checksum: None,
                size_bytes: None,
            }),
        ),
    })
}

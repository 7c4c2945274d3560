use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use tracing::error;

use crate::application::error::HttpError;
use crate::infra::uploads::UploadStorage;

use super::{DatabaseHealth, RouterState, db_health_response};

#[derive(Clone)]
pub struct HttpState {
    pub db: Arc<dyn DatabaseHealth>,
    pub upload_storage: Arc<UploadStorage>,
}

pub fn build_public_router(state: RouterState) -> Router<RouterState> {
    Router::new()
        .route("/_health/db", get(db_health))
        .route("/images/{*path}", get(serve_image))
        .with_state(state)
}

async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.ping().await)
}

async fn serve_image(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_image";

    match state.upload_storage.read(&path).await {
        Ok(bytes) => build_image_response(&path, bytes),
        Err(err) if err.is_not_found() => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Image not found",
            format!("no stored image at `{path}`"),
        )
        .into_response(),
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path,
                error = %err,
                "failed to read stored image"
            );
            HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read image",
                &err,
            )
            .into_response()
        }
    }
}

fn build_image_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    // Stored names embed a fresh uuid, so content never changes under a name.
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

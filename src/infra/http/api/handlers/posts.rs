use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::auth::AuthContext;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::infra::http::api::models::{
    DeletedResponse, FeedQuery, PostCreateRequest, PostUpdateRequest,
};
use crate::infra::http::api::state::ApiState;

pub async fn list_posts(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.posts.list(&ctx, query.page).await?;
    Ok(Json(page))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    ApiJson(payload): ApiJson<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.create(&ctx, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get_by_id(&ctx, id).await?;
    Ok(Json(post))
}

pub async fn update_post(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<PostUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.update(&ctx, id, payload.into()).await?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.posts.delete(&ctx, id).await?;
    Ok(Json(DeletedResponse { deleted: true, id }))
}

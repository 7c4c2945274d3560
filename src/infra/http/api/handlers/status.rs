use axum::Json;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;

use crate::application::auth::AuthContext;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::ApiJson;
use crate::infra::http::api::models::StatusUpdateRequest;
use crate::infra::http::api::state::ApiState;

pub async fn get_status(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.status.current_user(&ctx).await?;
    Ok(Json(account))
}

pub async fn update_status(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    ApiJson(payload): ApiJson<StatusUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.status.update_status(&ctx, &payload.status).await?;
    Ok(Json(account))
}

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::accounts::RegisterCommand;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::ApiJson;
use crate::infra::http::api::models::{LoginRequest, SignupRequest};
use crate::infra::http::api::state::ApiState;

pub async fn signup(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .accounts
        .register(RegisterCommand {
            email: payload.email,
            name: payload.name,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn login(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .accounts
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(outcome))
}

pub mod api;
mod middleware;
mod public;

pub use api::ApiState;
pub use public::HttpState;

use async_trait::async_trait;
use axum::Router;
use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;
use crate::infra::db::PostgresRepositories;

use self::middleware::{cors, log_responses, set_request_context};

/// Liveness check for the backing database.
#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl DatabaseHealth for PostgresRepositories {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.health_check().await
    }
}

fn db_health_response(result: Result<(), sqlx::Error>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

#[derive(Clone)]
pub struct RouterState {
    pub http: HttpState,
    pub api: ApiState,
}

impl FromRef<RouterState> for HttpState {
    fn from_ref(state: &RouterState) -> Self {
        state.http.clone()
    }
}

impl FromRef<RouterState> for ApiState {
    fn from_ref(state: &RouterState) -> Self {
        state.api.clone()
    }
}

/// Assemble the complete application router.
pub fn build_router(state: RouterState, upload_body_limit: usize) -> Router {
    public::build_public_router(state.clone())
        .merge(api::build_api_router(state.clone(), upload_body_limit))
        .with_state(state)
        .layer(from_fn(log_responses))
        .layer(from_fn(cors))
        .layer(from_fn(set_request_context))
}

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
};

use crate::infra::http::RouterState;

pub fn build_api_router(state: RouterState, upload_body_limit: usize) -> Router<RouterState> {
    let auth_state = state.api.clone();

    Router::new()
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route(
            "/auth/status",
            get(handlers::get_status).patch(handlers::update_status),
        )
        .route("/feed/posts", get(handlers::list_posts))
        .route("/feed/post", post(handlers::create_post))
        .route(
            "/feed/post/{id}",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/post-image",
            put(handlers::upload_image).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::credential_context,
        ))
}

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::Response;

use super::state::ApiState;

/// Attach an `AuthContext` to every request. Requests are never rejected
/// here; services decide whether an anonymous caller may proceed.
pub async fn credential_context(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_bearer(request.headers().get(AUTHORIZATION));
    let ctx = state.verifier.verify(token);
    request.extensions_mut().insert(ctx.clone());

    // Echoed onto the response so request logging can name the caller.
    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

fn extract_bearer(header: Option<&HeaderValue>) -> Option<&str> {
    let raw = header?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Rewrite every failure status to 401 Unauthorized.
///
/// Older clients of the list, add and remove endpoints treat 401 as the one
/// failure code. The JSON body is passed through unchanged, so `status: false`
/// and the error message are still available to them.
pub async fn legacy_status_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        debug!(original = %status, "Rewriting failure status for legacy client");
        *response.status_mut() = StatusCode::UNAUTHORIZED;
    }

    response
}

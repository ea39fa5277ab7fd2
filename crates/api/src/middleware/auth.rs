//! Bearer token guard for the scheduled-cleanup endpoint.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::AppState;
use crate::error::ApiError;
use driftbox_shared::AppError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Rejects the request unless it carries the configured cleanup token.
///
/// Passes everything through when no token is configured.
pub async fn cleanup_token_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.cleanup_token.as_deref() else {
        return next.run(request).await;
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);

    if token == Some(expected) {
        next.run(request).await
    } else {
        warn!("Rejected cleanup request with missing or wrong token");
        ApiError(AppError::Unauthorized(
            "cleanup requires a valid bearer token".to_string(),
        ))
        .into_response()
    }
}

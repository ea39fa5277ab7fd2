//! Cleanup routes.
//!
//! `POST /cleanup` runs cleanup on demand, for one space or all of them.
//! `GET /cleanup` is the entry point for external schedulers and runs a
//! global cleanup; it requires the configured bearer token.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::cleanup_token_middleware;
use driftbox_core::space::CleanupResult;
use driftbox_shared::AppError;

/// Creates the cleanup routes.
#[allow(clippy::needless_pass_by_value)]
pub fn routes(state: AppState) -> Router<AppState> {
    let scheduled =
        get(scheduled_cleanup).route_layer(from_fn_with_state(state, cleanup_token_middleware));

    Router::new().route("/cleanup", post(manual_cleanup).merge(scheduled))
}

/// Request body for an on-demand cleanup.
#[derive(Debug, Default, Deserialize)]
pub struct CleanupRequest {
    /// Space to clean. All spaces when absent.
    #[serde(default, alias = "spaceId")]
    pub space_id: Option<String>,
}

/// POST `/cleanup`
/// Delete expired files now. An empty body cleans every space.
async fn manual_cleanup(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<CleanupResult>> {
    let request: CleanupRequest = if body.is_empty() {
        CleanupRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError(AppError::Validation(format!("invalid cleanup request: {e}"))))?
    };

    let space_id = request.space_id.as_deref().filter(|s| !s.is_empty());
    let result = state.spaces.clean_expired_files(space_id).await?;

    info!(
        space_id = space_id.unwrap_or("*"),
        deleted = result.deleted_count,
        "Manual cleanup finished"
    );
    Ok(Json(result))
}

/// GET `/cleanup`
/// Global cleanup for external schedulers.
async fn scheduled_cleanup(State(state): State<AppState>) -> ApiResult<Json<CleanupResult>> {
    let result = state.spaces.clean_expired_files(None).await?;
    Ok(Json(result))
}

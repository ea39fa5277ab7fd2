//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod cleanup;
pub mod files;
pub mod health;

/// Creates the API router with routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(files::routes())
        .merge(cleanup::routes(state))
}

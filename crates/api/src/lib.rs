//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes over [`SpaceService`]
//! - Cleanup token middleware
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use driftbox_core::space::SpaceService;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// File lifecycle service.
    pub spaces: Arc<SpaceService>,
    /// Token required by the scheduled-cleanup endpoint, if any.
    pub cleanup_token: Option<String>,
}

impl AppState {
    /// Create state without a cleanup token.
    #[must_use]
    pub fn new(spaces: Arc<SpaceService>) -> Self {
        Self {
            spaces,
            cleanup_token: None,
        }
    }

    /// Require `token` on the scheduled-cleanup endpoint.
    #[must_use]
    pub fn with_cleanup_token(mut self, token: Option<String>) -> Self {
        self.cleanup_token = token.filter(|t| !t.is_empty());
        self
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.spaces.config().max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

//! Request middleware.

pub mod auth;

pub use auth::cleanup_token_middleware;

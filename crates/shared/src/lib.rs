//! Shared configuration and error types for Driftbox.
//!
//! This crate provides the pieces used across all other crates:
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;

pub use config::{AppConfig, CleanupSettings, ServerConfig, StorageKind, StorageSettings};
pub use error::{AppError, AppResult};

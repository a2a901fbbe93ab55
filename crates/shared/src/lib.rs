//! Shared types, errors, and configuration for Trustbook.
//!
//! This crate provides common types used across all other crates:
//! - Money type with exact decimal precision
//! - Typed IDs for type-safe entity references
//! - Pagination types for list queries
//! - Application-wide error types
//! - Configuration management
//! - Tracing subscriber bootstrap for binaries

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

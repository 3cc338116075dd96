//! CopyVault Common Library
//!
//! Shared code for the CopyVault services including:
//! - Database models, schema bootstrap and repository
//! - Domain services for copies, categories, challenges and users
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability
//! - The EcoVerse gameplay engine and its key-value persistence

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod ecoverse;
pub mod errors;
pub mod metrics;
pub mod services;
pub mod storage;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{DbPool, Repository};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Color assigned to a category created without one
pub const DEFAULT_CATEGORY_COLOR: &str = "#3b82f6";

/// Category label assigned to a copy created without one
pub const DEFAULT_COPY_CATEGORY: &str = "general";

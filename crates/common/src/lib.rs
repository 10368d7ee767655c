//! AuthorMatch Common Library
//!
//! Shared code for the AuthorMatch crates including:
//! - Entity catalog, raw table loader and models
//! - Artifact cache for derived tables
//! - Text normalization
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod cache;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod text;

// Re-export commonly used types
pub use cache::ArtifactCache;
pub use catalog::{Catalog, CatalogLoader};
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use text::Normalizer;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Biblioteca Common Library
//!
//! Shared code for the Biblioteca catalog client including:
//! - Book and author models with the backend's wire format
//! - The remote gateway trait, an HTTP and an in-memory implementation
//! - Error types and handling
//! - Configuration management
//! - Metrics and tracing setup

pub mod config;
pub mod errors;
pub mod gateway;
pub mod metrics;
pub mod models;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use gateway::{HttpGateway, InMemoryGateway, LibraryGateway, Operation};
pub use models::{Attachment, Author, AuthorId, Book, BookId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

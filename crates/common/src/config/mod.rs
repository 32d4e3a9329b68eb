//! Configuration management for the Biblioteca client
//!
//! Supports loading configuration from:
//! - A `.env` file (via dotenvy)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Environment variables (prefixed with APP__)
//! - The `BACKEND_URL` variable, which overrides the backend base URL
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Remote backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Attachment selection rules
    #[serde(default)]
    pub attachments: AttachmentConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the REST backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Collection path for books
    #[serde(default = "default_books_path")]
    pub books_path: String,

    /// Collection path for authors
    #[serde(default = "default_authors_path")]
    pub authors_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttachmentConfig {
    /// MIME type accepted at selection time
    #[serde(default = "default_accepted_content_type")]
    pub accepted_content_type: String,

    /// Advisory size limit in bytes; exceeding it only logs a warning
    #[serde(default = "default_advisory_max_bytes")]
    pub advisory_max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error) or a full EnvFilter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name attached to log lines
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

/// Base URL used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

// Default value functions
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_books_path() -> String { "books".to_string() }
fn default_authors_path() -> String { "authors".to_string() }
fn default_accepted_content_type() -> String { "application/pdf".to_string() }
fn default_advisory_max_bytes() -> usize { 10 * 1024 * 1024 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { "biblioteca".to_string() }

impl AppConfig {
    /// Load configuration from `.env`, files and environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("backend.base_url", DEFAULT_BASE_URL)?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__BACKEND__BASE_URL=http://books.internal:8080
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("backend.base_url", std::env::var("BACKEND_URL").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl BackendConfig {
    /// Base URL without a trailing slash
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Absolute URL of the books collection
    pub fn books_url(&self) -> String {
        format!("{}/{}", self.base(), self.books_path.trim_matches('/'))
    }

    /// Absolute URL of the authors collection
    pub fn authors_url(&self) -> String {
        format!("{}/{}", self.base(), self.authors_path.trim_matches('/'))
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            books_path: default_books_path(),
            authors_path: default_authors_path(),
        }
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            accepted_content_type: default_accepted_content_type(),
            advisory_max_bytes: default_advisory_max_bytes(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            attachments: AttachmentConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8080");
        assert_eq!(config.attachments.accepted_content_type, "application/pdf");
        assert_eq!(config.attachments.advisory_max_bytes, 10_485_760);
    }

    #[test]
    fn test_collection_urls_ignore_stray_slashes() {
        let backend = BackendConfig {
            base_url: "http://books.local:9000/".to_string(),
            books_path: "/books/".to_string(),
            authors_path: "authors".to_string(),
        };
        assert_eq!(backend.books_url(), "http://books.local:9000/books");
        assert_eq!(backend.authors_url(), "http://books.local:9000/authors");
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: AppConfig = Config::builder()
            .set_override("backend.base_url", "http://example.test")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.backend.base_url, "http://example.test");
        assert_eq!(config.backend.books_path, "books");
        assert_eq!(config.observability.log_level, "info");
    }
}

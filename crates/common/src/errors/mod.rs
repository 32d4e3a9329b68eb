//! Error types for the Biblioteca client
//!
//! Provides a single error taxonomy with:
//! - Local validation failures that never reach the network
//! - Remote failures (non-2xx answers, connection failures, bad bodies)
//! - The partial-save state of the two-phase persist
//! - Error codes and banner text for the UI layer

use crate::gateway::Operation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidAttachment,

    // Remote errors (4xxx / 5xxx)
    NotFound,
    RemoteRejected,
    RemoteFailure,

    // Transport errors (7xxx)
    ConnectionError,
    DecodeError,

    // Persist errors (8xxx)
    PartialSave,

    // Internal errors (9xxx)
    ConfigurationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidAttachment => 1002,

            ErrorCode::NotFound => 4004,
            ErrorCode::RemoteRejected => 4001,
            ErrorCode::RemoteFailure => 5001,

            ErrorCode::ConnectionError => 7001,
            ErrorCode::DecodeError => 7002,

            ErrorCode::PartialSave => 8001,

            ErrorCode::ConfigurationError => 9001,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Unsupported attachment type: {content_type}")]
    InvalidAttachment { content_type: String },

    #[error("{operation} failed with HTTP status {status}")]
    Remote { operation: Operation, status: u16 },

    #[error("{operation} could not reach the backend: {message}")]
    Connection { operation: Operation, message: String },

    #[error("{operation} returned an unreadable body: {message}")]
    Decode { operation: Operation, message: String },

    /// Phase 1 (record save) succeeded, phase 2 (attachment upload) did not.
    #[error("Book {book_id} saved, but the attachment upload failed: {source}")]
    PartialSave {
        book_id: i64,
        #[source]
        source: Box<AppError>,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidAttachment { .. } => ErrorCode::InvalidAttachment,
            AppError::Remote { status: 404, .. } => ErrorCode::NotFound,
            AppError::Remote { status, .. } if *status < 500 => ErrorCode::RemoteRejected,
            AppError::Remote { .. } => ErrorCode::RemoteFailure,
            AppError::Connection { .. } => ErrorCode::ConnectionError,
            AppError::Decode { .. } => ErrorCode::DecodeError,
            AppError::PartialSave { .. } => ErrorCode::PartialSave,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
        }
    }

    /// The HTTP status the backend answered with, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Remote { status, .. } => Some(*status),
            AppError::PartialSave { source, .. } => source.status(),
            _ => None,
        }
    }

    /// The gateway operation that failed, for remote and transport errors
    pub fn operation(&self) -> Option<Operation> {
        match self {
            AppError::Remote { operation, .. }
            | AppError::Connection { operation, .. }
            | AppError::Decode { operation, .. } => Some(*operation),
            AppError::PartialSave { source, .. } => source.operation(),
            _ => None,
        }
    }

    /// Errors that never left the client
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. } | AppError::InvalidAttachment { .. }
        )
    }

    /// Backend rejected the request (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }

    /// Backend failed while handling the request (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    /// Banner text shown to the user; no error propagates past the view-model.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation { message, .. } => message.clone(),
            AppError::InvalidAttachment { .. } => "Please select a PDF file.".to_string(),
            AppError::Remote { status: 404, .. } => {
                "The record no longer exists on the server.".to_string()
            }
            AppError::Remote { status, .. } => {
                format!("The server rejected the request (HTTP {}). Try again.", status)
            }
            AppError::Connection { .. } => {
                "Could not connect to the backend. Check that it is running.".to_string()
            }
            AppError::Decode { .. } => "The server sent an unexpected response.".to_string(),
            AppError::PartialSave { .. } => "Book saved, but the PDF upload failed.".to_string(),
            AppError::Configuration { message } => format!("Configuration error: {}", message),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::Remote {
            operation: Operation::GetBook,
            status: 404,
        };
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.code().as_code(), 4004);
        assert!(err.is_client_error());
        assert!(!err.is_local());
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "Invalid title".into(),
            field: Some("title".into()),
        };
        assert!(err.is_local());
        assert_eq!(err.status(), None);
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_partial_save_keeps_upload_cause() {
        let err = AppError::PartialSave {
            book_id: 7,
            source: Box::new(AppError::Remote {
                operation: Operation::UploadAttachment,
                status: 500,
            }),
        };
        assert_eq!(err.code(), ErrorCode::PartialSave);
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.operation(), Some(Operation::UploadAttachment));
        assert!(err.is_server_error());
        assert_eq!(err.user_message(), "Book saved, but the PDF upload failed.");
    }

    #[test]
    fn test_connection_error_has_no_status() {
        let err = AppError::Connection {
            operation: Operation::ListBooks,
            message: "connection refused".into(),
        };
        assert_eq!(err.code(), ErrorCode::ConnectionError);
        assert_eq!(err.status(), None);
        assert_eq!(err.code().as_code(), 7001);
        assert!(err.user_message().contains("Could not connect"));
    }
}

//! Error types for the ReviewFlow engine
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - Stable machine-readable error codes
//! - Severity classification for logging
//!
//! No operation in this crate retries on its own; retry policy belongs
//! to the caller.

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
    MissingField,
    InvalidFormat,

    // Authorization errors (2xxx)
    Forbidden,
    NotOwner,

    // Lifecycle state errors (3xxx)
    InvalidState,
    ImmutablePaper,
    ImmutableReview,

    // Resource errors (4xxx)
    NotFound,
    PaperNotFound,
    ReviewNotFound,
    ReviewerNotFound,
    CitationNotFound,

    // Conflict errors (5xxx)
    Conflict,
    AlreadyAssigned,
    AlreadySubmitted,
    DuplicateCitation,
    DuplicateLink,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,
    TransactionError,

    // External service errors (8xxx)
    NotificationError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingField => 1002,
            ErrorCode::InvalidFormat => 1003,

            // Authorization (2xxx)
            ErrorCode::Forbidden => 2001,
            ErrorCode::NotOwner => 2002,

            // Lifecycle state (3xxx)
            ErrorCode::InvalidState => 3001,
            ErrorCode::ImmutablePaper => 3002,
            ErrorCode::ImmutableReview => 3003,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::PaperNotFound => 4002,
            ErrorCode::ReviewNotFound => 4003,
            ErrorCode::ReviewerNotFound => 4004,
            ErrorCode::CitationNotFound => 4005,

            // Conflicts (5xxx)
            ErrorCode::Conflict => 5001,
            ErrorCode::AlreadyAssigned => 5002,
            ErrorCode::AlreadySubmitted => 5003,
            ErrorCode::DuplicateCitation => 5004,
            ErrorCode::DuplicateLink => 5005,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,
            ErrorCode::TransactionError => 7003,

            // External (8xxx)
            ErrorCode::NotificationError => 8001,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Authorization errors
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Caller {caller_id} does not own {resource_type} {id}")]
    NotOwner {
        caller_id: String,
        resource_type: String,
        id: String,
    },

    // Lifecycle state errors
    #[error("Operation not allowed in state '{status}': {message}")]
    InvalidState { status: String, message: String },

    #[error("Paper {id} is immutable in state '{status}'")]
    ImmutablePaper { id: String, status: String },

    #[error("Review {id} is completed and immutable")]
    ImmutableReview { id: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Paper not found: {id}")]
    PaperNotFound { id: String },

    #[error("Review not found: {id}")]
    ReviewNotFound { id: String },

    #[error("Reviewer profile not found: {id}")]
    ReviewerNotFound { id: String },

    #[error("Citation not found: {id}")]
    CitationNotFound { id: String },

    // Conflict errors
    #[error("Stale write: {message}")]
    Conflict { message: String },

    #[error("Reviewer {reviewer_id} already assigned to paper {paper_id} in cycle {cycle}")]
    AlreadyAssigned {
        paper_id: String,
        reviewer_id: String,
        cycle: i32,
    },

    #[error("Review {id} has already been submitted")]
    AlreadySubmitted { id: String },

    #[error("Duplicate citation: {message}")]
    DuplicateCitation { message: String },

    #[error("Citation {citation_id} is already linked to paper {paper_id}")]
    DuplicateLink {
        citation_id: String,
        paper_id: String,
    },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Transaction failed: {message}")]
    Transaction { message: String },

    // External service errors
    #[error("Notification delivery failed: {message}")]
    Notification { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::NotOwner { .. } => ErrorCode::NotOwner,
            AppError::InvalidState { .. } => ErrorCode::InvalidState,
            AppError::ImmutablePaper { .. } => ErrorCode::ImmutablePaper,
            AppError::ImmutableReview { .. } => ErrorCode::ImmutableReview,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::PaperNotFound { .. } => ErrorCode::PaperNotFound,
            AppError::ReviewNotFound { .. } => ErrorCode::ReviewNotFound,
            AppError::ReviewerNotFound { .. } => ErrorCode::ReviewerNotFound,
            AppError::CitationNotFound { .. } => ErrorCode::CitationNotFound,
            AppError::Conflict { .. } => ErrorCode::Conflict,
            AppError::AlreadyAssigned { .. } => ErrorCode::AlreadyAssigned,
            AppError::AlreadySubmitted { .. } => ErrorCode::AlreadySubmitted,
            AppError::DuplicateCitation { .. } => ErrorCode::DuplicateCitation,
            AppError::DuplicateLink { .. } => ErrorCode::DuplicateLink,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Transaction { .. } => ErrorCode::TransactionError,
            AppError::Notification { .. } => ErrorCode::NotificationError,
            AppError::HttpClient(_) => ErrorCode::NotificationError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Check if this error is the caller's fault (bad input, stale data,
    /// illegal state transition). Logged at warn level.
    pub fn is_client_error(&self) -> bool {
        self.code().as_code() < 7000
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Check if the caller should re-fetch and decide (conflict family)
    pub fn is_conflict(&self) -> bool {
        let code = self.code().as_code();
        (5000..6000).contains(&code)
    }

    /// Log this error at the appropriate severity
    pub fn log(&self) {
        let code = self.code();
        if self.is_server_error() {
            tracing::error!(error = %self, code = ?code, "Server error");
        } else {
            tracing::warn!(error = %self, code = ?code, "Client error");
        }
    }
}

/// Structured error payload for embedding applications
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorDetails {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            details: None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation {
            message: err.to_string(),
            field: None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::PaperNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::PaperNotFound);
        assert_eq!(err.code().as_code(), 4002);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_conflict_classification() {
        let err = AppError::AlreadyAssigned {
            paper_id: "p".into(),
            reviewer_id: "r".into(),
            cycle: 1,
        };
        assert!(err.is_conflict());
        assert!(err.is_client_error());

        let err = AppError::Conflict {
            message: "version mismatch".into(),
        };
        assert!(err.is_conflict());
    }

    #[test]
    fn test_immutable_paper_is_state_error() {
        let err = AppError::ImmutablePaper {
            id: "p".into(),
            status: "published".into(),
        };
        assert_eq!(err.code(), ErrorCode::ImmutablePaper);
        assert!(!err.is_conflict());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_error() {
        let err = AppError::Internal {
            message: "Something went wrong".into(),
        };
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_error_details_payload() {
        let err = AppError::AlreadySubmitted { id: "rv".into() };
        let details = ErrorDetails::from(&err);
        assert_eq!(details.code, ErrorCode::AlreadySubmitted);
        assert!(details.message.contains("rv"));
    }
}

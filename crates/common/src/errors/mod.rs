//! Error types for AuthorMatch
//!
//! Provides:
//! - One variant per batch failure (input, cache, workers)
//! - Numeric error codes grouped by layer
//! - Conversions from the I/O, CSV, cache and configuration layers
//!
//! Missing entities are never errors: catalog lookups degrade to neutral
//! defaults. Errors here abort a batch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors (1xxx)
    MissingInput,
    CsvError,

    // Cache errors (2xxx)
    CacheError,
    InvalidDerivationName,

    // Worker errors (3xxx)
    WorkerFailed,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Input (1xxx)
            ErrorCode::MissingInput => 1001,
            ErrorCode::CsvError => 1002,

            // Cache (2xxx)
            ErrorCode::CacheError => 2001,
            ErrorCode::InvalidDerivationName => 2002,

            // Workers (3xxx)
            ErrorCode::WorkerFailed => 3001,

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
    // Input errors
    #[error("Input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // Cache errors
    #[error("Cache error: {message}")]
    CacheError { message: String },

    #[error("Invalid derivation name: '{name}'")]
    InvalidDerivationName { name: String },

    // Worker errors
    #[error("Worker '{worker}' failed: {message}")]
    WorkerFailed { worker: String, message: String },

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
            AppError::MissingInput { .. } => ErrorCode::MissingInput,
            AppError::Csv(_) => ErrorCode::CsvError,
            AppError::CacheError { .. } => ErrorCode::CacheError,
            AppError::InvalidDerivationName { .. } => ErrorCode::InvalidDerivationName,
            AppError::WorkerFailed { .. } => ErrorCode::WorkerFailed,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error came from the inputs rather than from this process
    pub fn is_input_error(&self) -> bool {
        matches!(self.code(), ErrorCode::MissingInput | ErrorCode::CsvError)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
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

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::WorkerFailed {
            worker: "blocking task".to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::MissingInput {
            path: PathBuf::from("data/Paper.csv"),
        };
        assert_eq!(err.code(), ErrorCode::MissingInput);
        assert_eq!(err.code().as_code(), 1001);
        assert!(err.is_input_error());
        assert!(err.to_string().contains("data/Paper.csv"));
    }

    #[test]
    fn test_cache_error() {
        let err = AppError::InvalidDerivationName {
            name: "../escape".into(),
        };
        assert_eq!(err.code(), ErrorCode::InvalidDerivationName);
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_csv_error_is_input_error() {
        let err: AppError = csv::ReaderBuilder::new()
            .from_path("/nonexistent/authormatch/Paper.csv")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), ErrorCode::CsvError);
        assert_eq!(err.code().as_code(), 1002);
        assert!(err.is_input_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AppError = io.into();
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}

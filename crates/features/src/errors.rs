//! Feature service error types

use authormatch_common::errors::AppError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeatureError>;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Output error for {path}: {message}")]
    Output { path: PathBuf, message: String },

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl FeatureError {
    pub fn output(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        FeatureError::Output {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

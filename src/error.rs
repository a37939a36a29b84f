//! Application-wide error types using thiserror
//!
//! Layer-specific errors (exchange, sheet, checkpoint) convert into AppError
//! so the scheduler can propagate every failure with `?`.

use thiserror::Error;

use crate::adapters::errors::{ExchangeError, SheetError};
use crate::core::checkpoint::CheckpointError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

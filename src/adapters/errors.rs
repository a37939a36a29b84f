//! Adapter error types
//!
//! Price-source failures are wrapped in `ExchangeError`, spreadsheet failures
//! in `SheetError`. Both implement thiserror for consistent handling.

use thiserror::Error;

/// Price source error types
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Transport-level failure (DNS, TLS, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Exchange answered with a non-success status
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid or unexpected response from exchange
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for exchange operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;

/// Spreadsheet store error types
#[derive(Error, Debug)]
pub enum SheetError {
    /// Credentials file unreadable or token exchange rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Sheets API answered with a non-success status
    #[error("Sheets API status {status}: {body}")]
    Status { status: u16, body: String },

    /// Spreadsheet or worksheet could not be located
    #[error("Not found: {0}")]
    NotFound(String),

    /// A1 reference could not be parsed
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Value has no spreadsheet representation
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias for sheet operations
pub type SheetResult<T> = std::result::Result<T, SheetError>;

//! P2P spread recorder
//!
//! Samples the spot and P2P marketplace price of an asset on a fixed daily
//! schedule and records the spread into a spreadsheet grid:
//! - Price sources (Binance spot, Binance P2P) via REST
//! - Spreadsheet store (Google Sheets) via REST
//! - Time-bucket scheduler with on-disk checkpoint for resume

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;

pub use error::AppError;

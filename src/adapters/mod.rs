//! Adapters for the external collaborators
//!
//! This module provides the price sources (Binance spot and P2P) and the
//! spreadsheet store (Google Sheets, in-memory) behind the traits the
//! scheduler depends on.

pub mod binance;
pub mod errors;
pub mod sheets;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use binance::{BinanceClient, BinanceConfig};
pub use errors::{ExchangeError, ExchangeResult, SheetError, SheetResult};
pub use sheets::{CellRef, GoogleSheetsClient, MemorySheet, RangeRef};
pub use traits::{PriceSource, SheetStore};
pub use types::CellColor;

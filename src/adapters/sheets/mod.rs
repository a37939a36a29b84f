//! Spreadsheet stores
//!
//! This module is organized into submodules:
//! - `a1` - A1 cell and range addressing
//! - `auth` - Service-account token exchange
//! - `config` - Spreadsheet location and credentials
//! - `client` - Google Sheets implementation of `SheetStore`
//! - `memory` - In-memory implementation of `SheetStore`

pub mod a1;
pub mod auth;
mod client;
mod config;
mod memory;

// Re-export public items
pub use a1::{CellRef, RangeRef};
pub use auth::{ServiceAccountKey, TokenProvider};
pub use client::GoogleSheetsClient;
pub use config::SheetsConfig;
pub use memory::MemorySheet;

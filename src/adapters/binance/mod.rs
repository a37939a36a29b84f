//! Binance price source
//!
//! This module is organized into submodules:
//! - `config` - Endpoints and market parameters
//! - `types` - API request and response types
//! - `client` - `BinanceClient` implementing `PriceSource`

mod client;
mod config;
mod types;

// Re-export public items
pub use client::{parse_p2p_price, parse_spot_price, BinanceClient};
pub use config::BinanceConfig;
pub use types::{P2pSearchRequest, P2pSearchResponse, SpotTicker};

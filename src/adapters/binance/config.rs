//! Binance configuration
//!
//! Endpoints and market parameters for the spot ticker and the P2P
//! advertisement search.

use serde::{Deserialize, Serialize};

use crate::config::constants;

pub const DEFAULT_SPOT_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_P2P_BASE_URL: &str = "https://p2p.binance.com";

/// Configuration for the Binance price source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceConfig {
    /// Spot REST base URL
    #[serde(default = "default_spot_base_url")]
    pub spot_base_url: String,
    /// Spot symbol, e.g. "USDTRUB"
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// P2P REST base URL
    #[serde(default = "default_p2p_base_url")]
    pub p2p_base_url: String,
    /// Asset traded on P2P, e.g. "USDT"
    #[serde(default = "default_asset")]
    pub asset: String,
    /// Fiat currency on P2P, e.g. "RUB"
    #[serde(default = "default_fiat")]
    pub fiat: String,
    /// "BUY" or "SELL", from the taker's point of view
    #[serde(default = "default_trade_type")]
    pub trade_type: String,
    /// Advertisements requested per search
    #[serde(default = "default_rows")]
    pub rows: u32,
    /// Attempts on a malformed spot response before giving up
    #[serde(default = "constants::spot_max_attempts")]
    pub spot_max_attempts: u32,
}

fn default_spot_base_url() -> String {
    DEFAULT_SPOT_BASE_URL.to_string()
}

fn default_symbol() -> String {
    "USDTRUB".to_string()
}

fn default_p2p_base_url() -> String {
    DEFAULT_P2P_BASE_URL.to_string()
}

fn default_asset() -> String {
    "USDT".to_string()
}

fn default_fiat() -> String {
    "RUB".to_string()
}

fn default_trade_type() -> String {
    "BUY".to_string()
}

fn default_rows() -> u32 {
    2
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            spot_base_url: default_spot_base_url(),
            symbol: default_symbol(),
            p2p_base_url: default_p2p_base_url(),
            asset: default_asset(),
            fiat: default_fiat(),
            trade_type: default_trade_type(),
            rows: default_rows(),
            spot_max_attempts: constants::spot_max_attempts(),
        }
    }
}

impl BinanceConfig {
    /// Spot ticker endpoint
    pub fn spot_price_url(&self) -> String {
        format!("{}/api/v3/ticker/price", self.spot_base_url.trim_end_matches('/'))
    }

    /// P2P advertisement search endpoint
    pub fn p2p_search_url(&self) -> String {
        format!(
            "{}/bapi/c2c/v2/friendly/c2c/adv/search",
            self.p2p_base_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BinanceConfig::default();
        assert_eq!(config.symbol, "USDTRUB");
        assert_eq!(config.asset, "USDT");
        assert_eq!(config.fiat, "RUB");
        assert_eq!(config.trade_type, "BUY");
        assert_eq!(config.rows, 2);
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let config = BinanceConfig {
            spot_base_url: "http://127.0.0.1:1234/".to_string(),
            p2p_base_url: "http://127.0.0.1:1234/".to_string(),
            ..BinanceConfig::default()
        };
        assert_eq!(config.spot_price_url(), "http://127.0.0.1:1234/api/v3/ticker/price");
        assert_eq!(
            config.p2p_search_url(),
            "http://127.0.0.1:1234/bapi/c2c/v2/friendly/c2c/adv/search"
        );
    }
}

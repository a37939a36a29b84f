//! Binance price source
//!
//! Spot price from the public ticker endpoint, marketplace prices from the
//! P2P advertisement search the Binance web client uses.

use std::str::FromStr;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, ORIGIN, USER_AGENT};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::adapters::binance::config::BinanceConfig;
use crate::adapters::binance::types::{P2pSearchRequest, P2pSearchResponse, SpotTicker};
use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::PriceSource;
use crate::config::constants;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/104.0.0.0 Safari/537.36";

/// Binance spot + P2P client implementing `PriceSource`
pub struct BinanceClient {
    config: BinanceConfig,
    http: reqwest::Client,
}

impl BinanceClient {
    /// Create a new client with the given configuration
    pub fn new(config: BinanceConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(constants::http_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, http }
    }

    pub fn config(&self) -> &BinanceConfig {
        &self.config
    }

    /// Headers the P2P endpoint expects from its web client
    fn p2p_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("clienttype", HeaderValue::from_static("web"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("lang", HeaderValue::from_static("en"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        if let Ok(origin) = HeaderValue::from_str(self.config.p2p_base_url.trim_end_matches('/')) {
            headers.insert(ORIGIN, origin);
        }
        headers
    }
}

/// Parse a spot ticker body into a price
///
/// Any deviation from `{"price": "<decimal>"}` is reported as
/// `InvalidResponse`, which `spot_price` treats as retryable.
pub fn parse_spot_price(body: &str) -> ExchangeResult<Decimal> {
    let ticker: SpotTicker = serde_json::from_str(body)
        .map_err(|e| ExchangeError::InvalidResponse(format!("Invalid JSON: {} - {}", e, body)))?;
    let raw = ticker
        .price
        .ok_or_else(|| ExchangeError::InvalidResponse(format!("No price in response: {}", body)))?;
    Decimal::from_str(raw.trim())
        .map_err(|e| ExchangeError::InvalidResponse(format!("Invalid price '{}': {}", raw, e)))
}

/// Parse a P2P search body into the first advertisement's price
pub fn parse_p2p_price(body: &str) -> ExchangeResult<Option<Decimal>> {
    let response: P2pSearchResponse = serde_json::from_str(body)
        .map_err(|e| ExchangeError::InvalidResponse(format!("Invalid JSON: {} - {}", e, body)))?;

    if let Some(code) = response.code.as_deref() {
        if code != "000000" {
            return Err(ExchangeError::InvalidResponse(format!(
                "P2P error {}: {}",
                code,
                response.message.unwrap_or_default()
            )));
        }
    }

    let Some(first) = response.data.unwrap_or_default().into_iter().next() else {
        return Ok(None);
    };

    Decimal::from_str(first.adv.price.trim())
        .map(Some)
        .map_err(|e| ExchangeError::InvalidResponse(format!("Invalid price '{}': {}", first.adv.price, e)))
}

#[async_trait]
impl PriceSource for BinanceClient {
    async fn spot_price(&self) -> ExchangeResult<Option<Decimal>> {
        let url = self.config.spot_price_url();
        let max_attempts = self.config.spot_max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let response = self
                .http
                .get(&url)
                .query(&[("symbol", self.config.symbol.as_str())])
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;
            if !status.is_success() {
                return Err(ExchangeError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }

            match parse_spot_price(&text) {
                Ok(price) => {
                    debug!(symbol = %self.config.symbol, price = %price, attempt, "Spot price fetched");
                    return Ok(Some(price));
                }
                Err(e) => {
                    warn!(
                        symbol = %self.config.symbol,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Malformed spot price response"
                    );
                }
            }
        }

        warn!(symbol = %self.config.symbol, max_attempts, "Spot price unavailable after retries");
        Ok(None)
    }

    async fn marketplace_price(
        &self,
        payment_method: &str,
        limit: Option<Decimal>,
    ) -> ExchangeResult<Option<Decimal>> {
        let body = P2pSearchRequest {
            pro_merchant_ads: false,
            page: 1,
            rows: self.config.rows,
            pay_types: vec![payment_method],
            countries: Vec::new(),
            publisher_type: None,
            asset: &self.config.asset,
            fiat: &self.config.fiat,
            trans_amount: limit,
            trade_type: &self.config.trade_type,
        };

        let response = self
            .http
            .post(self.config.p2p_search_url())
            .headers(self.p2p_headers())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let price = parse_p2p_price(&text)?;
        debug!(
            payment_method,
            limit = ?limit,
            price = ?price,
            "Marketplace price fetched"
        );
        Ok(price)
    }

    fn source_name(&self) -> &'static str {
        "binance"
    }
}

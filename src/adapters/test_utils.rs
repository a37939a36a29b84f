//! Shared test utilities for adapter consumers
//!
//! Provides a configurable `MockPriceSource` used by the spread and scheduler
//! test modules.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::PriceSource;

/// Price source returning canned prices
#[derive(Default)]
pub struct MockPriceSource {
    /// Spot price returned by `spot_price`
    pub spot: Option<Decimal>,
    /// Marketplace price per payment method; unknown methods have no ads
    pub prices: HashMap<String, Decimal>,
    /// When true, `spot_price` returns an error
    pub fail_spot: bool,
    pub spot_calls: AtomicUsize,
    /// Every `(payment_method, limit)` requested, in order
    pub marketplace_calls: Mutex<Vec<(String, Option<Decimal>)>>,
}

impl MockPriceSource {
    pub fn new(spot: &str) -> Self {
        Self {
            spot: Some(dec(spot)),
            ..Self::default()
        }
    }

    pub fn with_price(mut self, method: &str, price: &str) -> Self {
        self.prices.insert(method.to_string(), dec(price));
        self
    }

    pub fn without_spot(mut self) -> Self {
        self.spot = None;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_spot = true;
        self
    }

    pub fn requested_methods(&self) -> Vec<String> {
        self.marketplace_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn spot_price(&self) -> ExchangeResult<Option<Decimal>> {
        self.spot_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_spot {
            return Err(ExchangeError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        Ok(self.spot)
    }

    async fn marketplace_price(
        &self,
        payment_method: &str,
        limit: Option<Decimal>,
    ) -> ExchangeResult<Option<Decimal>> {
        self.marketplace_calls
            .lock()
            .unwrap()
            .push((payment_method.to_string(), limit));
        Ok(self.prices.get(payment_method).copied())
    }

    fn source_name(&self) -> &'static str {
        "mock"
    }
}

/// Decimal literal helper for tests
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

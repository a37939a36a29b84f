//! Binance API request and response types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `GET /api/v3/ticker/price` body
#[derive(Debug, Deserialize)]
pub struct SpotTicker {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

/// P2P advertisement search body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct P2pSearchRequest<'a> {
    pub pro_merchant_ads: bool,
    pub page: u32,
    pub rows: u32,
    pub pay_types: Vec<&'a str>,
    pub countries: Vec<String>,
    pub publisher_type: Option<String>,
    pub asset: &'a str,
    pub fiat: &'a str,
    /// Serialized as a decimal string; omitted when no limit is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trans_amount: Option<Decimal>,
    pub trade_type: &'a str,
}

/// P2P advertisement search response
#[derive(Debug, Deserialize)]
pub struct P2pSearchResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<P2pAdvertisement>>,
}

#[derive(Debug, Deserialize)]
pub struct P2pAdvertisement {
    pub adv: P2pAdv,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct P2pAdv {
    pub price: String,
    #[serde(default)]
    pub trade_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(trans_amount: Option<Decimal>) -> P2pSearchRequest<'static> {
        P2pSearchRequest {
            pro_merchant_ads: false,
            page: 1,
            rows: 2,
            pay_types: vec!["RosBank"],
            countries: Vec::new(),
            publisher_type: None,
            asset: "USDT",
            fiat: "RUB",
            trans_amount,
            trade_type: "BUY",
        }
    }

    #[test]
    fn test_request_uses_camel_case() {
        let json = serde_json::to_value(request(Some(Decimal::new(5000, 0)))).unwrap();
        assert_eq!(json["payTypes"][0], "RosBank");
        assert_eq!(json["proMerchantAds"], false);
        assert_eq!(json["tradeType"], "BUY");
        assert_eq!(json["transAmount"], "5000");
        assert!(json["publisherType"].is_null());
    }

    #[test]
    fn test_request_without_limit_omits_amount() {
        let json = serde_json::to_value(request(None)).unwrap();
        assert!(json.get("transAmount").is_none());
    }
}

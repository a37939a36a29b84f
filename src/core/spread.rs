//! Spread calculation between the P2P marketplace and the spot market
//!
//! # Architecture
//! - `marketplace_prices`: lazy stream of per-method quotes, one request each
//! - `compute_spread`: best quote minus spot, rounded to 3 decimals
//! - `find_max_spread`: end-of-day argmax over the recorded row

use futures_util::stream::{self, Stream, StreamExt, TryStreamExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::adapters::errors::ExchangeResult;
use crate::adapters::traits::PriceSource;

/// Decimal places kept in a recorded spread
pub const SPREAD_DECIMALS: u32 = 3;

// =============================================================================
// Marketplace quotes
// =============================================================================

/// Best advertised price for one payment method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceQuote {
    pub payment_method: String,
    /// `None` when no advertisement matched
    pub price: Option<Decimal>,
}

/// Stream of marketplace quotes, one per enabled method
///
/// Nothing is fetched until the stream is polled; methods are queried one
/// after another in the given order.
pub fn marketplace_prices<'a, P>(
    source: &'a P,
    methods: &'a [String],
    limit: Option<Decimal>,
) -> impl Stream<Item = ExchangeResult<MarketplaceQuote>> + 'a
where
    P: PriceSource + ?Sized,
{
    stream::iter(methods).then(move |method| async move {
        let price = source.marketplace_price(method, limit).await?;
        tracing::debug!(
            source = source.source_name(),
            payment_method = %method,
            price = ?price,
            "Marketplace quote"
        );
        Ok(MarketplaceQuote {
            payment_method: method.clone(),
            price,
        })
    })
}

// =============================================================================
// Spread
// =============================================================================

/// `round(best - spot, 3)`
///
/// Rounding is banker's rounding on the decimal value; trailing zeros are
/// dropped so `1.50` is recorded as `1.5`.
pub fn spread_value(best: Decimal, spot: Decimal) -> Decimal {
    (best - spot).round_dp(SPREAD_DECIMALS).normalize()
}

/// Consume the quote stream and compute the spread against `spot`
///
/// Methods without an advertisement are skipped. When no quote carries a
/// price (including an empty stream) the spread is zero.
pub async fn compute_spread<S>(spot: Decimal, quotes: S) -> ExchangeResult<Decimal>
where
    S: Stream<Item = ExchangeResult<MarketplaceQuote>>,
{
    let best = quotes
        .try_fold(None, |best: Option<Decimal>, quote| async move {
            Ok(match (best, quote.price) {
                (Some(b), Some(p)) => Some(b.max(p)),
                (None, p) => p,
                (b, None) => b,
            })
        })
        .await?;

    Ok(match best {
        Some(best) => spread_value(best, spot),
        None => Decimal::ZERO,
    })
}

// =============================================================================
// End-of-day maximum
// =============================================================================

/// Parse a number as shown in a sheet cell
///
/// Whitespace (including group spaces) is dropped. When both "." and ","
/// appear, the rightmost one is the decimal point. A lone "," is a decimal
/// point unless the text is grouped in thousands ("10,000").
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let normalized = match (compact.rfind('.'), compact.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (group, point) = if dot > comma { (',', '.') } else { ('.', ',') };
            compact
                .chars()
                .filter(|c| *c != group)
                .map(|c| if c == point { '.' } else { c })
                .collect()
        }
        (None, Some(_)) if is_grouped_thousands(&compact, ',') => compact.replace(',', ""),
        (None, Some(_)) => compact.replace(',', "."),
        (Some(_), None) if compact.matches('.').count() > 1 && is_grouped_thousands(&compact, '.') => {
            compact.replace('.', "")
        }
        _ => compact,
    };
    normalized.parse().ok()
}

/// `1,234` or `-12,345,678`: a 1-3 digit head followed by 3-digit groups
fn is_grouped_thousands(text: &str, separator: char) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let groups: Vec<&str> = digits.split(separator).collect();
    let all_digits = |g: &str| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit());

    groups.len() > 1
        && groups[0].len() <= 3
        && all_digits(groups[0])
        && groups[1..].iter().all(|g| g.len() == 3 && all_digits(g))
}

/// Parse a recorded spread cell
///
/// Empty or unparseable cells count as zero.
pub fn parse_spread_cell(value: &str) -> Decimal {
    parse_amount(value).unwrap_or(Decimal::ZERO)
}

/// Index of the leftmost maximum value
///
/// Returns 0 for an empty slice.
pub fn find_max_spread<S: AsRef<str>>(values: &[S]) -> usize {
    let mut best_index = 0;
    let mut best_value: Option<Decimal> = None;
    for (index, value) in values.iter().enumerate() {
        let value = parse_spread_cell(value.as_ref());
        if best_value.map_or(true, |best| value > best) {
            best_index = index;
            best_value = Some(value);
        }
    }
    best_index
}

// =============================================================================
// Unit Tests
// =============================================================================

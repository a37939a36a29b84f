//! Adapter trait definitions
//!
//! `PriceSource` is the interface the scheduler uses to sample prices,
//! `SheetStore` the interface it uses to read and write the recording grid.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::adapters::errors::{ExchangeResult, SheetResult};
use crate::adapters::sheets::a1::{CellRef, RangeRef};
use crate::adapters::types::CellColor;

/// Source of spot and P2P marketplace prices
///
/// # Example Implementation
///
/// ```ignore
/// use async_trait::async_trait;
///
/// struct FixedPrices;
///
/// #[async_trait]
/// impl PriceSource for FixedPrices {
///     async fn spot_price(&self) -> ExchangeResult<Option<Decimal>> {
///         Ok(Some(dec!(95.00)))
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current spot price of the configured pair
    ///
    /// Returns `Ok(None)` when the exchange keeps answering with a malformed
    /// body after the bounded number of attempts.
    async fn spot_price(&self) -> ExchangeResult<Option<Decimal>>;

    /// Best advertised marketplace price for one payment method
    ///
    /// # Arguments
    /// * `payment_method` - Payment method identifier (e.g., "RosBank")
    /// * `limit` - Transaction amount filter; `None` disables the filter
    ///
    /// # Returns
    /// Price of the first advertisement, `None` if there is no matching ad
    async fn marketplace_price(
        &self,
        payment_method: &str,
        limit: Option<Decimal>,
    ) -> ExchangeResult<Option<Decimal>>;

    /// Source name for logging
    fn source_name(&self) -> &'static str;
}

/// Key-addressed read/write access to a persistent grid
///
/// Implementations carry no business logic: the scheduler decides which
/// cells to touch.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Read a single cell, `None` when empty
    async fn get_cell(&self, cell: CellRef) -> SheetResult<Option<String>>;

    /// Overwrite a single cell with literal text
    ///
    /// The text is stored as-is: "18.10" stays a label, never a number or
    /// a date in the spreadsheet's locale.
    async fn set_cell(&self, cell: CellRef, value: &str) -> SheetResult<()>;

    /// Overwrite a single cell with a numeric value
    async fn set_number(&self, cell: CellRef, value: Decimal) -> SheetResult<()>;

    /// Read a rectangular range as rows of cells
    ///
    /// Numbers come back unformatted ("10000.5"), text as stored. Trailing
    /// empty cells may be omitted, as the Sheets API does.
    async fn get_range(&self, range: RangeRef) -> SheetResult<Vec<Vec<String>>>;

    /// Overwrite a rectangular range with literal text
    async fn set_range(&self, range: RangeRef, values: Vec<Vec<String>>) -> SheetResult<()>;

    /// Apply a background color to a single cell
    async fn highlight_cell(&self, cell: CellRef, color: CellColor) -> SheetResult<()>;

    /// Remove every value and format from the worksheet
    async fn clear(&self) -> SheetResult<()>;
}

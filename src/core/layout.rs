//! Recording grid layout
//!
//! Resolves the configured columns and rows into cell references once, then
//! reads and writes the fixed parts of the sheet: method names and their
//! flags, the limit cell, bucket labels, date labels and the daily spreads.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::adapters::errors::SheetResult;
use crate::adapters::sheets::{CellRef, RangeRef};
use crate::adapters::traits::SheetStore;
use crate::adapters::types::CellColor;
use crate::config::AppConfig;
use crate::core::schedule::TimeBucket;
use crate::core::spread::parse_amount;
use crate::error::AppError;

pub const LIMIT_LABEL: &str = "Limit";

/// Payment method with its header and flag cells
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSlot {
    pub name: String,
    /// Statically enabled in the configuration
    pub enabled: bool,
    pub name_cell: CellRef,
    pub flag_cell: CellRef,
}

/// Resolved cell positions of the recording grid
///
/// A payment method is sampled when it is enabled in the configuration and
/// the flag cell below its name is ticked. The flag values "0", "false" and
/// "no" (any case) count as unticked, like an empty cell.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub methods: Vec<MethodSlot>,
    pub limit_label_cell: CellRef,
    pub limit_cell: CellRef,
    pub buckets: Vec<TimeBucket>,
    pub bucket_header_row: u32,
    pub first_data_row: u32,
    pub max_row: u32,
    pub date_column: u32,
    pub date_label_format: String,
    pub highlight_color: CellColor,
}

impl SheetLayout {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let layout = &config.layout;
        let invalid = |what: &str, value: &str| {
            AppError::Config(format!("{}: invalid cell or column '{}'", what, value))
        };

        let methods = config
            .payment_methods
            .iter()
            .map(|method| {
                let name_cell = CellRef::from_column(&method.column, layout.methods_row)
                    .map_err(|_| invalid(&method.name, &method.column))?;
                Ok(MethodSlot {
                    name: method.name.clone(),
                    enabled: method.enabled,
                    name_cell,
                    flag_cell: name_cell.below(),
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let buckets = config
            .buckets
            .iter()
            .map(TimeBucket::from_config)
            .collect::<Result<Vec<_>, AppError>>()?;

        let date_column = CellRef::from_column(&layout.date_column, 1)
            .map_err(|_| invalid("date_column", &layout.date_column))?
            .col;

        Ok(Self {
            methods,
            limit_label_cell: CellRef::parse(&layout.limit_label_cell)
                .map_err(|_| invalid("limit_label_cell", &layout.limit_label_cell))?,
            limit_cell: CellRef::parse(&layout.limit_cell)
                .map_err(|_| invalid("limit_cell", &layout.limit_cell))?,
            buckets,
            bucket_header_row: layout.bucket_header_row,
            first_data_row: layout.first_data_row,
            max_row: layout.max_row,
            date_column,
            date_label_format: layout.date_label_format.clone(),
            highlight_color: layout.highlight_color,
        })
    }

    /// Write method names, the limit label and the bucket labels
    pub async fn prepare<S: SheetStore + ?Sized>(&self, sheet: &S) -> SheetResult<()> {
        for method in &self.methods {
            sheet.set_cell(method.name_cell, &method.name).await?;
        }
        sheet.set_cell(self.limit_label_cell, LIMIT_LABEL).await?;
        for bucket in &self.buckets {
            sheet
                .set_cell(self.bucket_header_cell(bucket), &bucket.label)
                .await?;
        }
        info!(
            methods = self.methods.len(),
            buckets = self.buckets.len(),
            "Worksheet prepared"
        );
        Ok(())
    }

    /// Transaction amount filter from the limit cell
    ///
    /// An empty cell disables the filter. Text values are parsed with
    /// `parse_amount`, so "10,000" is ten thousand and "10 000,50" keeps its
    /// decimals; an unparseable value also disables the filter.
    pub async fn read_limit<S: SheetStore + ?Sized>(&self, sheet: &S) -> SheetResult<Option<Decimal>> {
        let Some(raw) = sheet.get_cell(self.limit_cell).await? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        match parse_amount(&raw) {
            Some(limit) => Ok(Some(limit)),
            None => {
                warn!(cell = %self.limit_cell, value = %raw, "Unparseable limit, filter disabled");
                Ok(None)
            }
        }
    }

    /// Names of the methods enabled both in configuration and on the sheet
    pub async fn enabled_methods<S: SheetStore + ?Sized>(&self, sheet: &S) -> SheetResult<Vec<String>> {
        let mut enabled = Vec::new();
        for method in self.methods.iter().filter(|m| m.enabled) {
            let flag = sheet.get_cell(method.flag_cell).await?;
            if is_flag_enabled(flag.as_deref()) {
                enabled.push(method.name.clone());
            }
        }
        debug!(enabled = ?enabled, "Enabled payment methods");
        Ok(enabled)
    }

    pub fn bucket_cell(&self, index: usize, row: u32) -> Option<CellRef> {
        self.buckets
            .get(index)
            .map(|bucket| CellRef::new(bucket.column, row))
    }

    pub fn date_cell(&self, row: u32) -> CellRef {
        CellRef::new(self.date_column, row)
    }

    pub fn date_label(&self, date: NaiveDate) -> String {
        date.format(&self.date_label_format).to_string()
    }

    /// Write the date label of `row` as text
    pub async fn write_date_label<S: SheetStore + ?Sized>(
        &self,
        sheet: &S,
        row: u32,
        date: NaiveDate,
    ) -> SheetResult<()> {
        let label = self.date_label(date);
        sheet.set_cell(self.date_cell(row), &label).await?;
        debug!(row, label = %label, "Date label written");
        Ok(())
    }

    /// Recorded values of `row`, one entry per bucket ("" when empty)
    pub async fn read_spreads<S: SheetStore + ?Sized>(&self, sheet: &S, row: u32) -> SheetResult<Vec<String>> {
        let (Some(first), Some(last)) = (
            self.buckets.iter().map(|b| b.column).min(),
            self.buckets.iter().map(|b| b.column).max(),
        ) else {
            return Ok(Vec::new());
        };

        let range = RangeRef::new(CellRef::new(first, row), CellRef::new(last, row));
        let rows = sheet.get_range(range).await?;
        let values = rows.into_iter().next().unwrap_or_default();

        Ok(self
            .buckets
            .iter()
            .map(|bucket| {
                values
                    .get((bucket.column - first) as usize)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect())
    }

    fn bucket_header_cell(&self, bucket: &TimeBucket) -> CellRef {
        CellRef::new(bucket.column, self.bucket_header_row)
    }
}

/// Whether a flag cell enables its payment method
///
/// Empty, "0", "false" and "no" (any case) disable it; anything else enables.
pub fn is_flag_enabled(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"),
    }
}

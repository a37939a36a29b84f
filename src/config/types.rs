//! Configuration types for the recorder
//!
//! This module defines all configuration structs that are loaded from YAML.
//! Every section has defaults matching the original sheet layout, so an
//! empty document is a valid configuration.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::adapters::binance::BinanceConfig;
use crate::adapters::sheets::{CellRef, SheetsConfig};
use crate::adapters::types::CellColor;
use crate::config::constants;
use crate::error::AppError;

// ============================================================================
// Payment Methods
// ============================================================================

/// Single P2P payment method
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentMethodConfig {
    /// Binance pay type identifier (e.g., "RosBank")
    pub name: String,
    /// Disabled methods are never queried, whatever the sheet says
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Column of the header cell holding the name; the flag cell is below it
    pub column: String,
}

fn default_true() -> bool {
    true
}

fn default_payment_methods() -> Vec<PaymentMethodConfig> {
    [("RosBank", "B"), ("Tinkoff", "C"), ("RaiffeisenBankRussia", "D"), ("QIWI", "E")]
        .into_iter()
        .map(|(name, column)| PaymentMethodConfig {
            name: name.to_string(),
            enabled: true,
            column: column.to_string(),
        })
        .collect()
}

// ============================================================================
// Time Buckets
// ============================================================================

/// One daily sampling boundary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BucketConfig {
    /// Header label (e.g., "4:00")
    pub label: String,
    /// Boundary as hour of day, `(0, 24]`
    pub hour: f64,
    /// Column receiving this bucket's spread
    pub column: String,
}

fn default_buckets() -> Vec<BucketConfig> {
    [(4.0, "B"), (8.0, "C"), (12.0, "D"), (16.0, "E"), (20.0, "F"), (24.0, "G")]
        .into_iter()
        .map(|(hour, column)| BucketConfig {
            label: format!("{}:00", hour as u32),
            hour,
            column: column.to_string(),
        })
        .collect()
}

// ============================================================================
// Sheet Layout
// ============================================================================

/// Fixed cell conventions of the recording grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Row holding payment method names
    #[serde(default = "default_methods_row")]
    pub methods_row: u32,
    /// Cell receiving the "Limit" label
    #[serde(default = "default_limit_label_cell")]
    pub limit_label_cell: String,
    /// Cell holding the transaction-amount limit
    #[serde(default = "default_limit_cell")]
    pub limit_cell: String,
    /// Row holding the bucket labels
    #[serde(default = "default_bucket_header_row")]
    pub bucket_header_row: u32,
    /// First row receiving daily data
    #[serde(default = "default_first_data_row")]
    pub first_data_row: u32,
    /// Row at which the sheet counts as full
    #[serde(default = "default_max_row")]
    pub max_row: u32,
    /// Column receiving the date label
    #[serde(default = "default_date_column")]
    pub date_column: String,
    /// chrono format of the date label
    #[serde(default = "default_date_label_format")]
    pub date_label_format: String,
    /// Background of the day's max-spread cell
    #[serde(default)]
    pub highlight_color: CellColor,
}

fn default_methods_row() -> u32 {
    2
}
fn default_limit_label_cell() -> String {
    "F2".to_string()
}
fn default_limit_cell() -> String {
    "F3".to_string()
}
fn default_bucket_header_row() -> u32 {
    6
}
fn default_first_data_row() -> u32 {
    7
}
fn default_max_row() -> u32 {
    38
}
fn default_date_column() -> String {
    "A".to_string()
}
fn default_date_label_format() -> String {
    "%d.%m".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            methods_row: default_methods_row(),
            limit_label_cell: default_limit_label_cell(),
            limit_cell: default_limit_cell(),
            bucket_header_row: default_bucket_header_row(),
            first_data_row: default_first_data_row(),
            max_row: default_max_row(),
            date_column: default_date_column(),
            date_label_format: default_date_label_format(),
            highlight_color: CellColor::default(),
        }
    }
}

// ============================================================================
// Checkpoint
// ============================================================================

/// Location of the resume pointer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    #[serde(default = "default_checkpoint_path")]
    pub path: PathBuf,
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("last.txt")
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            path: default_checkpoint_path(),
        }
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub binance: BinanceConfig,
    #[serde(default = "default_payment_methods")]
    pub payment_methods: Vec<PaymentMethodConfig>,
    #[serde(default = "default_buckets")]
    pub buckets: Vec<BucketConfig>,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sheets: SheetsConfig::default(),
            binance: BinanceConfig::default(),
            payment_methods: default_payment_methods(),
            buckets: default_buckets(),
            layout: LayoutConfig::default(),
            checkpoint: CheckpointConfig::default(),
        }
    }
}

impl AppConfig {
    /// Apply environment variable overrides on top of the file values
    pub fn apply_env_overrides(&mut self) {
        self.sheets.apply_env_overrides();
        if let Some(path) = constants::checkpoint_path_override() {
            self.checkpoint.path = path;
        }
    }

    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        self.validate_buckets()?;
        self.validate_payment_methods()?;
        self.validate_layout()?;
        Ok(())
    }

    fn validate_buckets(&self) -> Result<(), AppError> {
        // Rule: at least one bucket
        if self.buckets.is_empty() {
            return Err(AppError::Config(
                "Configuration must contain at least one bucket".to_string(),
            ));
        }

        let mut previous = 0.0;
        let mut columns = HashSet::new();
        for bucket in &self.buckets {
            // Rule: boundaries strictly increasing within (0, 24]
            if !(bucket.hour > previous && bucket.hour <= 24.0) {
                return Err(AppError::Config(format!(
                    "Bucket '{}': hour must be > {} and <= 24 (got {})",
                    bucket.label, previous, bucket.hour
                )));
            }
            previous = bucket.hour;

            let cell = parse_column(&bucket.column, &format!("Bucket '{}'", bucket.label))?;
            if !columns.insert(cell.col) {
                return Err(AppError::Config(format!(
                    "Bucket '{}': column {} used twice",
                    bucket.label, bucket.column
                )));
            }
        }
        Ok(())
    }

    fn validate_payment_methods(&self) -> Result<(), AppError> {
        let mut names = HashSet::new();
        for method in &self.payment_methods {
            // Rule: name cannot be empty
            if method.name.trim().is_empty() {
                return Err(AppError::Config(
                    "Payment method name cannot be empty".to_string(),
                ));
            }
            // Rule: names unique
            if !names.insert(method.name.as_str()) {
                return Err(AppError::Config(format!(
                    "Payment method '{}' listed twice",
                    method.name
                )));
            }
            parse_column(&method.column, &format!("Payment method '{}'", method.name))?;
        }
        Ok(())
    }

    fn validate_layout(&self) -> Result<(), AppError> {
        let layout = &self.layout;

        // Rule: the grid needs at least one data row
        if layout.first_data_row == 0 || layout.max_row <= layout.first_data_row {
            return Err(AppError::Config(format!(
                "max_row ({}) must be > first_data_row ({}) >= 1",
                layout.max_row, layout.first_data_row
            )));
        }

        // Rule: header rows sit above the data
        if layout.methods_row == 0
            || layout.methods_row + 1 >= layout.first_data_row
            || layout.bucket_header_row >= layout.first_data_row
        {
            return Err(AppError::Config(format!(
                "methods_row ({}) and bucket_header_row ({}) must be above first_data_row ({})",
                layout.methods_row, layout.bucket_header_row, layout.first_data_row
            )));
        }

        for (name, cell) in [
            ("limit_label_cell", &layout.limit_label_cell),
            ("limit_cell", &layout.limit_cell),
        ] {
            CellRef::parse(cell)
                .map_err(|_| AppError::Config(format!("{}: invalid cell '{}'", name, cell)))?;
        }

        parse_column(&layout.date_column, "date_column")?;

        if layout.date_label_format.trim().is_empty() {
            return Err(AppError::Config(
                "date_label_format cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_column(column: &str, context: &str) -> Result<CellRef, AppError> {
    CellRef::from_column(column, 1)
        .map_err(|_| AppError::Config(format!("{}: invalid column '{}'", context, column)))
}

// ============================================================================
// Tests
// ============================================================================

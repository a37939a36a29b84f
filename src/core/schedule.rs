//! Time-bucket arithmetic
//!
//! A day is cut into fixed boundaries (04:00, 08:00, ... 24:00 by default).
//! Each boundary owns one column of the day's row. Times are handled as a
//! fractional hour `h + m/60`; seconds are ignored.

use std::time::Duration;

use chrono::{Days, NaiveDateTime, NaiveTime, Timelike};

use crate::adapters::sheets::CellRef;
use crate::config::BucketConfig;
use crate::error::AppError;

/// One sampling boundary and the column it fills
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBucket {
    pub label: String,
    /// Boundary as hour of day, `(0, 24]`
    pub hour: f64,
    /// Zero-based column index
    pub column: u32,
}

impl TimeBucket {
    pub fn from_config(config: &BucketConfig) -> Result<Self, AppError> {
        let cell = CellRef::from_column(&config.column, 1).map_err(|_| {
            AppError::Config(format!(
                "Bucket '{}': invalid column '{}'",
                config.label, config.column
            ))
        })?;
        Ok(Self {
            label: config.label.clone(),
            hour: config.hour,
            column: cell.col,
        })
    }
}

/// Result of a boundary search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextBucket {
    /// Position in the bucket list
    pub index: usize,
    pub boundary: f64,
    /// Time until the boundary
    pub sleep: Duration,
}

/// Hour of day as `h + m/60`
pub fn fractional_hour(time: NaiveTime) -> f64 {
    time.hour() as f64 + time.minute() as f64 / 60.0
}

/// Smallest boundary strictly after `hour`
///
/// Returns `None` once the last boundary of the day has passed; the caller
/// then waits for midnight and rolls the day over. `buckets` must be sorted
/// by hour.
pub fn next_bucket(buckets: &[TimeBucket], hour: f64) -> Option<NextBucket> {
    buckets
        .iter()
        .enumerate()
        .find(|(_, bucket)| bucket.hour > hour)
        .map(|(index, bucket)| NextBucket {
            index,
            boundary: bucket.hour,
            sleep: Duration::from_secs_f64((bucket.hour - hour) * 3600.0),
        })
}

/// Time left until the next local midnight
pub fn until_midnight(now: NaiveDateTime) -> Duration {
    now.date()
        .checked_add_days(Days::new(1))
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
        .and_then(|midnight| (midnight - now).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

//! Core module - scheduling loop, spread calculation, checkpointing, logging
//!
//! This module uses **explicit re-exports** instead of glob exports (`pub use module::*`)
//! to keep the public API visible in one place.
//!
//! ## Usage
//! Prefer importing from `crate::core`:
//! ```ignore
//! use crate::core::{Scheduler, CheckpointStore, SystemClock};
//! ```

pub mod checkpoint;
pub mod clock;
pub mod layout;
pub mod logging;
pub mod schedule;
pub mod scheduler;
pub mod spread;

// Explicit re-exports for checkpoint module
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore};

// Explicit re-exports for clock module
pub use clock::{Clock, SystemClock};

// Explicit re-exports for layout module
pub use layout::{is_flag_enabled, MethodSlot, SheetLayout};

// Explicit re-exports for logging module
pub use logging::{
    init_logging, init_logging_with_config, sanitize, LogFormat, LoggingConfig, SanitizedValue,
    DEFAULT_LOG_LEVEL,
};

// Explicit re-exports for schedule module
pub use schedule::{fractional_hour, next_bucket, until_midnight, NextBucket, TimeBucket};

// Explicit re-exports for scheduler module
pub use scheduler::{Scheduler, SchedulerState};

// Explicit re-exports for spread module
pub use spread::{
    compute_spread, find_max_spread, marketplace_prices, parse_amount, parse_spread_cell,
    spread_value, MarketplaceQuote,
};

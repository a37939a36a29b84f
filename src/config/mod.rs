//! Configuration module for recorder settings and YAML loading
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `PaymentMethodConfig`, `BucketConfig`, `LayoutConfig`)
//! - YAML loading functionality (`load_config`)
//! - Application constants with environment variable overrides

pub mod constants;
mod loader;
mod types;

// Re-export types
pub use types::{AppConfig, BucketConfig, CheckpointConfig, LayoutConfig, PaymentMethodConfig};

// Re-export loader functions
pub use loader::{load_config, load_config_from_str};

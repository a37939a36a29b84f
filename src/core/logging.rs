//! Structured logging for the recorder
//!
//! Built on `tracing` with:
//! - JSON output by default, one event per line
//! - Human-readable output with `LOG_FORMAT=pretty`
//! - Level filtering through `RUST_LOG`
//! - Redaction helpers for credentials and bearer tokens
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | `spread_recorder=info` | Level filter (standard tracing format) |
//! | `LOG_FORMAT` | `json` | Output format: `json` or `pretty` |
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use spread_recorder::core::logging::{init_logging, sanitize};
//!
//! init_logging();
//! tracing::info!(token = %sanitize(&access_token), "Access token refreshed");
//! // Output: token = "ya29...REDACTED"
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{fmt as ts_fmt, prelude::*, EnvFilter};

/// Flag to track if logging has been initialized (prevents double-init)
static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Default log level when RUST_LOG is not set
pub const DEFAULT_LOG_LEVEL: &str = "spread_recorder=info";

/// Output format of log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Wrapper for sensitive data that should be redacted in logs.
///
/// Values longer than 8 characters keep their first 4 characters so two
/// tokens can still be told apart; shorter values are fully redacted.
#[derive(Clone)]
pub struct SanitizedValue<'a>(&'a str);

impl<'a> SanitizedValue<'a> {
    pub fn new(value: &'a str) -> Self {
        Self(value)
    }
}

impl fmt::Display for SanitizedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.chars().count() > 8 {
            let prefix: String = self.0.chars().take(4).collect();
            write!(f, "{}...REDACTED", prefix)
        } else {
            write!(f, "REDACTED")
        }
    }
}

impl fmt::Debug for SanitizedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SanitizedValue(***)")
    }
}

/// Shorthand for `SanitizedValue::new(value)`.
pub fn sanitize(value: &str) -> SanitizedValue<'_> {
    SanitizedValue::new(value)
}

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter string (e.g., "spread_recorder=debug,spread_recorder::adapters=trace")
    pub level_filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level_filter: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Json,
        }
    }
}

impl LoggingConfig {
    /// Create a LoggingConfig from `RUST_LOG` and `LOG_FORMAT`.
    ///
    /// An unknown `LOG_FORMAT` falls back to JSON.
    pub fn from_env() -> Self {
        let level_filter = env::var("RUST_LOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let format = env::var("LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            level_filter,
            format,
        }
    }
}

/// Initialize the logging system from the environment.
///
/// Subsequent calls are no-ops.
pub fn init_logging() {
    init_logging_with_config(LoggingConfig::from_env());
}

/// Initialize the logging system with a specific configuration.
pub fn init_logging_with_config(config: LoggingConfig) {
    // Prevent double initialization
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    let env_filter = EnvFilter::try_new(&config.level_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(
                    ts_fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_file(false)
                        .with_line_number(false),
                )
                .with(env_filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(
                    ts_fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true),
                )
                .with(env_filter)
                .init();
        }
    }
}

/// Initialize logging for tests; errors from repeated init are ignored
#[cfg(test)]
pub fn init_test_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_sanitized_value_long_string() {
        let token = "ya29.a0AfH6SMBx";
        assert_eq!(format!("{}", sanitize(token)), "ya29...REDACTED");
    }

    #[test]
    fn test_sanitized_value_short_and_empty() {
        assert_eq!(format!("{}", sanitize("abc")), "REDACTED");
        assert_eq!(format!("{}", sanitize("")), "REDACTED");
        // 8 chars is not > 8
        assert_eq!(format!("{}", sanitize("12345678")), "REDACTED");
    }

    #[test]
    fn test_sanitized_value_multibyte_prefix() {
        let value = "ключ-сервисного-аккаунта";
        assert_eq!(format!("{}", sanitize(value)), "ключ...REDACTED");
    }

    #[test]
    fn test_sanitized_value_debug() {
        assert_eq!(format!("{:?}", sanitize("secret-value")), "SanitizedValue(***)");
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!(" JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level_filter, "spread_recorder=info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    #[serial(env)]
    fn test_logging_config_from_env() {
        env::set_var("RUST_LOG", "spread_recorder=debug");
        env::set_var("LOG_FORMAT", "pretty");
        let config = LoggingConfig::from_env();
        assert_eq!(config.level_filter, "spread_recorder=debug");
        assert_eq!(config.format, LogFormat::Pretty);

        env::set_var("LOG_FORMAT", "yaml");
        env::remove_var("RUST_LOG");
        let config = LoggingConfig::from_env();
        assert_eq!(config.level_filter, DEFAULT_LOG_LEVEL);
        assert_eq!(config.format, LogFormat::Json);

        env::remove_var("LOG_FORMAT");
    }
}

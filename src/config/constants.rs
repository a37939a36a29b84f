//! Application constants and configuration defaults
//!
//! Values that operators tune without editing the YAML file. Each can be
//! overridden via an environment variable.

use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Price Source
// =============================================================================

/// Attempts on a malformed spot price response (default: 3)
///
/// Environment variable: `SPOT_MAX_ATTEMPTS`
pub fn spot_max_attempts() -> u32 {
    std::env::var("SPOT_MAX_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(3)
}

/// Timeout for every outbound HTTP request (default: 10 seconds)
///
/// Environment variable: `HTTP_TIMEOUT_SECS`
pub fn http_timeout() -> Duration {
    let secs = std::env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);
    Duration::from_secs(secs)
}

// =============================================================================
// Spreadsheet & Checkpoint
// =============================================================================

/// Spreadsheet (workbook) name override
///
/// Environment variable: `SPREADSHEET_NAME`
pub fn spreadsheet_name_override() -> Option<String> {
    non_empty_var("SPREADSHEET_NAME")
}

/// Service-account key path override
///
/// Environment variable: `GOOGLE_CREDENTIALS_PATH`
pub fn credentials_path_override() -> Option<PathBuf> {
    non_empty_var("GOOGLE_CREDENTIALS_PATH").map(PathBuf::from)
}

/// Checkpoint file path override
///
/// Environment variable: `CHECKPOINT_PATH`
pub fn checkpoint_path_override() -> Option<PathBuf> {
    non_empty_var("CHECKPOINT_PATH").map(PathBuf::from)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print all configuration values (for startup logs)
pub fn log_configuration() {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Price source:");
    tracing::info!("  - Spot max attempts: {}", spot_max_attempts());
    tracing::info!("  - HTTP timeout: {:?}", http_timeout());
    tracing::info!("Overrides:");
    tracing::info!("  - Spreadsheet name: {:?}", spreadsheet_name_override());
    tracing::info!("  - Credentials path: {:?}", credentials_path_override());
    tracing::info!("  - Checkpoint path: {:?}", checkpoint_path_override());
    tracing::info!("==================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn test_default_values() {
        std::env::remove_var("SPOT_MAX_ATTEMPTS");
        std::env::remove_var("HTTP_TIMEOUT_SECS");
        assert_eq!(spot_max_attempts(), 3);
        assert_eq!(http_timeout(), Duration::from_secs(10));
    }

    #[test]
    #[serial(env)]
    fn test_env_override() {
        std::env::set_var("SPOT_MAX_ATTEMPTS", "5");
        assert_eq!(spot_max_attempts(), 5);

        // Zero attempts would never query the exchange
        std::env::set_var("SPOT_MAX_ATTEMPTS", "0");
        assert_eq!(spot_max_attempts(), 3);

        std::env::remove_var("SPOT_MAX_ATTEMPTS");
    }

    #[test]
    #[serial(env)]
    fn test_path_overrides() {
        std::env::set_var("GOOGLE_CREDENTIALS_PATH", "/etc/recorder/key.json");
        std::env::set_var("SPREADSHEET_NAME", "   ");
        assert_eq!(
            credentials_path_override(),
            Some(PathBuf::from("/etc/recorder/key.json"))
        );
        assert_eq!(spreadsheet_name_override(), None);

        std::env::remove_var("GOOGLE_CREDENTIALS_PATH");
        std::env::remove_var("SPREADSHEET_NAME");
        assert_eq!(credentials_path_override(), None);
    }
}

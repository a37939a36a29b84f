//! Wall-clock access for the scheduler
//!
//! The scheduler never reads the system time directly; it asks a `Clock`.
//! `SystemClock` is the production implementation, tests drive the loop
//! with a clock whose `sleep` advances a virtual time instantly.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

/// Source of "now" and of suspension
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;

    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Local wall clock backed by tokio timers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
pub use manual::ManualClock;


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_sleep_advances_time() {
        let clock = ManualClock::at("2026-10-18", "03:30:00");
        clock.sleep(Duration::from_secs(1800)).await;
        assert_eq!(clock.now().format("%H:%M").to_string(), "04:00");
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1800)]);
    }

    #[tokio::test]
    async fn test_system_clock_sleep() {
        let start = std::time::Instant::now();
        SystemClock.sleep(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}

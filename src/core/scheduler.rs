//! Day and time-bucket scheduling loop
//!
//! The scheduler owns the recording position (row and date), wakes at each
//! bucket boundary, samples prices, writes the spread and persists the
//! checkpoint. Once the clock passes the row's date it highlights the
//! finished row's maximum and moves one row down; when the grid is full it
//! clears the sheet and starts over at the first data row.
//!
//! # States
//! - `Waiting`: sleeping until the next boundary (or midnight)
//! - `Sampling`: fetching prices and writing one cell
//! - `DayDone`: closing the finished row and allocating the next one
//! - `SheetFull`: clearing the sheet and restarting at the first data row

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::adapters::traits::{PriceSource, SheetStore};
use crate::config::AppConfig;
use crate::core::checkpoint::{Checkpoint, CheckpointStore};
use crate::core::clock::Clock;
use crate::core::layout::SheetLayout;
use crate::core::schedule::{fractional_hour, next_bucket, until_midnight};
use crate::core::spread::{compute_spread, find_max_spread, marketplace_prices};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Waiting,
    Sampling,
    DayDone,
    SheetFull,
}

/// Recording loop over a price source, a sheet and a clock
pub struct Scheduler<P, S, C> {
    prices: P,
    sheet: S,
    clock: C,
    checkpoints: CheckpointStore,
    layout: SheetLayout,
    row: u32,
    date: NaiveDate,
    /// Boundary of the last bucket written on the current row
    last_written: Option<f64>,
    state: SchedulerState,
}

impl<P, S, C> Scheduler<P, S, C>
where
    P: PriceSource,
    S: SheetStore,
    C: Clock,
{
    /// Resume from the stored checkpoint and prepare the worksheet
    ///
    /// Fails when the checkpoint is missing or malformed. A checkpoint at or
    /// past the last usable row resets the sheet right away.
    pub async fn start(
        config: &AppConfig,
        prices: P,
        sheet: S,
        checkpoints: CheckpointStore,
        clock: C,
    ) -> Result<Self, AppError> {
        let layout = SheetLayout::from_config(config)?;
        let checkpoint = checkpoints.load().await?;
        info!(
            path = %checkpoints.path().display(),
            row = checkpoint.row,
            date = %checkpoint.date,
            "Resuming from checkpoint"
        );

        let mut scheduler = Self {
            prices,
            sheet,
            clock,
            checkpoints,
            layout,
            row: checkpoint.row,
            date: checkpoint.date,
            last_written: None,
            state: SchedulerState::Waiting,
        };

        scheduler.layout.prepare(&scheduler.sheet).await?;
        if scheduler.row >= scheduler.layout.max_row {
            scheduler.reset_sheet().await?;
        } else {
            scheduler
                .layout
                .write_date_label(&scheduler.sheet, scheduler.row, scheduler.date)
                .await?;
        }

        Ok(scheduler)
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sheet(&self) -> &S {
        &self.sheet
    }

    pub fn prices(&self) -> &P {
        &self.prices
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// Run until a shutdown signal arrives or an operation fails
    pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<(), AppError> {
        info!(
            source = self.prices.source_name(),
            row = self.row,
            date = %self.date,
            "Scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!(row = self.row, date = %self.date, "Scheduler shutting down");
                    return Ok(());
                }
                result = self.step() => {
                    result?;
                }
            }
        }
    }

    /// Perform one transition and report which one it was
    ///
    /// - `SheetFull`: the grid was cleared and restarted
    /// - `DayDone`: the finished row was closed and the next one allocated
    /// - `Sampling`: slept until a boundary and recorded its bucket
    /// - `Waiting`: no bucket left today, slept until midnight
    pub async fn step(&mut self) -> Result<SchedulerState, AppError> {
        if self.row >= self.layout.max_row {
            self.reset_sheet().await?;
            return Ok(SchedulerState::SheetFull);
        }

        let now = self.clock.now();
        if now.date() > self.date {
            self.roll_over(now.date()).await?;
            return Ok(SchedulerState::DayDone);
        }
        if now.date() < self.date {
            // A row only ever moves forward in time; keep filling this one
            warn!(
                today = %now.date(),
                row = self.row,
                date = %self.date,
                "Clock is behind the checkpoint date, staying on the current row"
            );
        }

        // Never revisit a bucket already written on this row
        let mut hour = fractional_hour(now.time());
        if let Some(last) = self.last_written {
            hour = hour.max(last);
        }

        self.transition(SchedulerState::Waiting);
        match next_bucket(&self.layout.buckets, hour) {
            Some(next) => {
                info!(
                    now = %now.format("%d.%m %H:%M:%S"),
                    boundary = next.boundary,
                    sleep_secs = next.sleep.as_secs(),
                    "Sleeping until next bucket"
                );
                self.clock.sleep(next.sleep).await;
                self.record(next.index, next.boundary).await?;
                Ok(SchedulerState::Sampling)
            }
            None => {
                let sleep = until_midnight(now);
                info!(sleep_secs = sleep.as_secs(), "No bucket left today, sleeping until midnight");
                self.clock.sleep(sleep).await;
                Ok(SchedulerState::Waiting)
            }
        }
    }

    /// Sample prices and write the spread of one bucket
    async fn record(&mut self, index: usize, boundary: f64) -> Result<(), AppError> {
        self.transition(SchedulerState::Sampling);
        let cell = self
            .layout
            .bucket_cell(index, self.row)
            .ok_or_else(|| AppError::Config(format!("No bucket at index {}", index)))?;

        match self.sample().await? {
            Some(spread) => {
                self.sheet.set_number(cell, spread).await?;
                info!(cell = %cell, spread = %spread, "Spread recorded");
            }
            None => {
                warn!(cell = %cell, "Spot price unavailable, bucket left empty");
            }
        }

        self.last_written = Some(boundary);
        self.save_checkpoint().await?;
        self.transition(SchedulerState::Waiting);
        Ok(())
    }

    /// Spread for the current configuration, `None` without a spot price
    async fn sample(&self) -> Result<Option<Decimal>, AppError> {
        let limit = self.layout.read_limit(&self.sheet).await?;
        let methods = self.layout.enabled_methods(&self.sheet).await?;

        let Some(spot) = self.prices.spot_price().await? else {
            return Ok(None);
        };

        let quotes = marketplace_prices(&self.prices, &methods, limit);
        let spread = compute_spread(spot, quotes).await?;
        info!(
            spot = %spot,
            limit = ?limit,
            methods = methods.len(),
            spread = %spread,
            "Prices sampled"
        );
        Ok(Some(spread))
    }

    /// Highlight the finished row and allocate the row for `today`
    async fn roll_over(&mut self, today: NaiveDate) -> Result<(), AppError> {
        self.transition(SchedulerState::DayDone);

        let spreads = self.layout.read_spreads(&self.sheet, self.row).await?;
        let best = find_max_spread(&spreads);
        if let Some(cell) = self.layout.bucket_cell(best, self.row) {
            self.sheet
                .highlight_cell(cell, self.layout.highlight_color)
                .await?;
            info!(
                cell = %cell,
                value = %spreads.get(best).map(String::as_str).unwrap_or(""),
                "Max spread of the day highlighted"
            );
        }

        self.row += 1;
        self.date = today;
        self.last_written = None;

        if self.row < self.layout.max_row {
            self.layout
                .write_date_label(&self.sheet, self.row, self.date)
                .await?;
        }
        self.save_checkpoint().await?;
        info!(row = self.row, date = %self.date, "New day started");

        self.transition(SchedulerState::Waiting);
        Ok(())
    }

    /// Clear the sheet and restart at the first data row
    async fn reset_sheet(&mut self) -> Result<(), AppError> {
        self.transition(SchedulerState::SheetFull);
        warn!(
            row = self.row,
            max_row = self.layout.max_row,
            "Sheet full, clearing"
        );

        self.sheet.clear().await?;
        self.layout.prepare(&self.sheet).await?;

        self.row = self.layout.first_data_row;
        self.date = self.clock.now().date();
        self.last_written = None;

        self.layout
            .write_date_label(&self.sheet, self.row, self.date)
            .await?;
        self.save_checkpoint().await?;

        self.transition(SchedulerState::Waiting);
        Ok(())
    }

    async fn save_checkpoint(&self) -> Result<(), AppError> {
        self.checkpoints
            .save(&Checkpoint::new(self.row, self.date))
            .await?;
        Ok(())
    }

    fn transition(&mut self, next: SchedulerState) {
        if self.state != next {
            info!(
                from = ?self.state,
                to = ?next,
                row = self.row,
                date = %self.date,
                "Scheduler state change"
            );
            self.state = next;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::adapters::sheets::MemorySheet;
    use crate::adapters::test_utils::{dec, MockPriceSource};
    use crate::core::checkpoint::CheckpointError;
    use crate::core::clock::ManualClock;
    use tempfile::TempDir;

    type TestScheduler = Scheduler<MockPriceSource, MemorySheet, ManualClock>;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn prices() -> MockPriceSource {
        MockPriceSource::new("95.00")
            .with_price("RosBank", "96.50")
            .with_price("Tinkoff", "99.00")
            .with_price("QIWI", "95.80")
    }

    /// Sheet with RosBank and QIWI switched on, Tinkoff switched off
    fn flagged_sheet() -> MemorySheet {
        let sheet = MemorySheet::new();
        sheet.put("B3", "1");
        sheet.put("C3", "0");
        sheet.put("E3", "1");
        sheet
    }

    async fn start(
        dir: &TempDir,
        checkpoint: &str,
        now: (&str, &str),
        prices: MockPriceSource,
        sheet: MemorySheet,
    ) -> TestScheduler {
        let path = dir.path().join("last.txt");
        std::fs::write(&path, checkpoint).unwrap();
        Scheduler::start(
            &AppConfig::default(),
            prices,
            sheet,
            CheckpointStore::new(path),
            ManualClock::at(now.0, now.1),
        )
        .await
        .unwrap()
    }

    fn stored_checkpoint(dir: &TempDir) -> String {
        std::fs::read_to_string(dir.path().join("last.txt"))
            .unwrap()
            .trim()
            .to_string()
    }

    #[tokio::test]
    async fn test_start_prepares_sheet() {
        let dir = TempDir::new().unwrap();
        let scheduler = start(&dir, "7,2026-10-18", ("2026-10-18", "01:00:00"), prices(), flagged_sheet()).await;

        let sheet = scheduler.sheet();
        assert_eq!(sheet.value("B2").as_deref(), Some("RosBank"));
        assert_eq!(sheet.value("F2").as_deref(), Some("Limit"));
        assert_eq!(sheet.value("B6").as_deref(), Some("4:00"));
        assert_eq!(sheet.value("A7").as_deref(), Some("18.10"));
        assert_eq!(scheduler.row(), 7);
        assert_eq!(scheduler.state(), SchedulerState::Waiting);
    }

    #[tokio::test]
    async fn test_start_without_checkpoint_fails() {
        let dir = TempDir::new().unwrap();
        let result: Result<TestScheduler, _> = Scheduler::start(
            &AppConfig::default(),
            prices(),
            MemorySheet::new(),
            CheckpointStore::new(dir.path().join("last.txt")),
            ManualClock::at("2026-10-18", "01:00:00"),
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::Checkpoint(CheckpointError::Missing(_)))
        ));
    }

    #[tokio::test]
    async fn test_step_sleeps_until_boundary_and_records() {
        let dir = TempDir::new().unwrap();
        let mut scheduler = start(&dir, "7,2026-10-18", ("2026-10-18", "03:30:00"), prices(), flagged_sheet()).await;

        let handled = scheduler.step().await.unwrap();

        assert_eq!(handled, SchedulerState::Sampling);
        assert_eq!(scheduler.clock.sleeps(), vec![Duration::from_secs(1800)]);
        // Tinkoff is switched off on the sheet, so its 99.00 is ignored
        assert_eq!(scheduler.sheet().value("B7").as_deref(), Some("1.5"));
        assert!(scheduler.sheet().is_number("B7"));
        assert!(!scheduler.sheet().is_number("A7"));
        assert_eq!(scheduler.prices().requested_methods(), vec!["RosBank", "QIWI"]);
        assert_eq!(stored_checkpoint(&dir), "7,2026-10-18");
    }

    #[tokio::test]
    async fn test_bucket_never_written_twice() {
        let dir = TempDir::new().unwrap();
        let mut scheduler = start(&dir, "7,2026-10-18", ("2026-10-18", "03:30:00"), prices(), flagged_sheet()).await;
        scheduler.step().await.unwrap();

        // Clock reads slightly before the boundary that was just written
        scheduler.clock.set(
            date("2026-10-18").and_hms_opt(3, 59, 0).unwrap(),
        );
        scheduler.step().await.unwrap();

        let sleeps = scheduler.clock.sleeps();
        assert_eq!(sleeps[1], Duration::from_secs(4 * 3600));
        assert_eq!(scheduler.sheet().value("C7").as_deref(), Some("1.5"));
        assert_eq!(scheduler.prices().spot_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_full_day_fills_every_bucket() {
        let dir = TempDir::new().unwrap();
        let mut scheduler = start(&dir, "7,2026-10-18", ("2026-10-18", "00:00:00"), prices(), flagged_sheet()).await;

        for _ in 0..6 {
            assert_eq!(scheduler.step().await.unwrap(), SchedulerState::Sampling);
        }

        for cell in ["B7", "C7", "D7", "E7", "F7", "G7"] {
            assert_eq!(scheduler.sheet().value(cell).as_deref(), Some("1.5"), "{}", cell);
        }
        // The 24:00 bucket belongs to the day that just ended
        assert_eq!(scheduler.clock.now().date(), date("2026-10-19"));
        assert_eq!(stored_checkpoint(&dir), "7,2026-10-18");
    }

    #[tokio::test]
    async fn test_day_rollover_highlights_and_advances() {
        let dir = TempDir::new().unwrap();
        let sheet = flagged_sheet();
        sheet.put("B7", "1");
        sheet.put("D7", "2,5");
        sheet.put("F7", "2.5");
        let mut scheduler = start(&dir, "7,2026-10-18", ("2026-10-18", "23:00:00"), prices(), sheet).await;

        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::Sampling);
        assert_eq!(scheduler.sheet().value("G7").as_deref(), Some("1.5"));

        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::DayDone);
        assert_eq!(scheduler.sheet().highlighted_cells(), vec!["D7".to_string()]);
        assert_eq!(scheduler.row(), 8);
        assert_eq!(scheduler.date(), date("2026-10-19"));
        assert_eq!(scheduler.sheet().value("A8").as_deref(), Some("19.10"));
        assert_eq!(stored_checkpoint(&dir), "8,2026-10-19");
    }

    #[tokio::test]
    async fn test_rollover_after_downtime_uses_current_date() {
        let dir = TempDir::new().unwrap();
        let mut scheduler = start(&dir, "10,2026-10-15", ("2026-10-18", "09:00:00"), prices(), flagged_sheet()).await;
        assert_eq!(scheduler.sheet().value("A10").as_deref(), Some("15.10"));

        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::DayDone);
        assert_eq!(scheduler.row(), 11);
        assert_eq!(scheduler.sheet().value("A11").as_deref(), Some("18.10"));

        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::Sampling);
        assert_eq!(scheduler.clock.sleeps(), vec![Duration::from_secs(3 * 3600)]);
        assert_eq!(scheduler.sheet().value("D11").as_deref(), Some("1.5"));
    }

    #[tokio::test]
    async fn test_clock_behind_checkpoint_keeps_row() {
        let dir = TempDir::new().unwrap();
        let mut scheduler = start(&dir, "7,2026-10-19", ("2026-10-18", "10:00:00"), prices(), flagged_sheet()).await;

        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::Sampling);
        assert_eq!(scheduler.row(), 7);
        assert_eq!(scheduler.date(), date("2026-10-19"));
        assert_eq!(scheduler.sheet().value("D7").as_deref(), Some("1.5"));
        assert!(scheduler.sheet().highlighted_cells().is_empty());
        assert_eq!(stored_checkpoint(&dir), "7,2026-10-19");

        // Once the clock passes the checkpoint date the row advances as usual
        scheduler.clock.set(date("2026-10-20").and_hms_opt(1, 0, 0).unwrap());
        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::DayDone);
        assert_eq!(scheduler.row(), 8);
        assert_eq!(stored_checkpoint(&dir), "8,2026-10-20");
    }

    #[tokio::test]
    async fn test_sheet_full_at_startup_resets() {
        let dir = TempDir::new().unwrap();
        let sheet = flagged_sheet();
        sheet.put("C30", "4.2");
        let scheduler = start(&dir, "38,2026-10-17", ("2026-10-18", "10:00:00"), prices(), sheet).await;

        let sheet = scheduler.sheet();
        assert_eq!(sheet.clear_count(), 1);
        assert_eq!(sheet.value("C30"), None);
        assert_eq!(sheet.value("B2").as_deref(), Some("RosBank"));
        assert_eq!(sheet.value("A7").as_deref(), Some("18.10"));
        assert_eq!(scheduler.row(), 7);
        assert_eq!(scheduler.date(), date("2026-10-18"));
        assert_eq!(stored_checkpoint(&dir), "7,2026-10-18");
    }

    #[tokio::test]
    async fn test_sheet_full_after_last_row() {
        let dir = TempDir::new().unwrap();
        let mut scheduler = start(&dir, "37,2026-10-17", ("2026-10-18", "10:00:00"), prices(), flagged_sheet()).await;

        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::DayDone);
        assert_eq!(scheduler.row(), 38);
        assert_eq!(scheduler.sheet().value("A38"), None);
        assert_eq!(stored_checkpoint(&dir), "38,2026-10-18");

        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::SheetFull);
        assert_eq!(scheduler.sheet().clear_count(), 1);
        assert_eq!(scheduler.row(), 7);
        assert_eq!(stored_checkpoint(&dir), "7,2026-10-18");
    }

    #[tokio::test]
    async fn test_absent_spot_price_leaves_cell_empty() {
        let dir = TempDir::new().unwrap();
        let source = prices().without_spot();
        let mut scheduler = start(&dir, "7,2026-10-18", ("2026-10-18", "07:00:00"), source, flagged_sheet()).await;

        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::Sampling);
        assert_eq!(scheduler.sheet().value("C7"), None);
        assert!(scheduler.prices().requested_methods().is_empty());

        // The empty bucket is not retried
        scheduler.step().await.unwrap();
        assert_eq!(scheduler.clock.sleeps()[1], Duration::from_secs(4 * 3600));
    }

    #[tokio::test]
    async fn test_spot_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let source = prices().failing();
        let mut scheduler = start(&dir, "7,2026-10-18", ("2026-10-18", "07:00:00"), source, flagged_sheet()).await;

        let result = scheduler.step().await;
        assert!(matches!(result, Err(AppError::Exchange(_))));
        assert_eq!(scheduler.sheet().value("C7"), None);
    }

    #[tokio::test]
    async fn test_limit_cell_filters_marketplace() {
        let dir = TempDir::new().unwrap();
        let sheet = flagged_sheet();
        sheet.put("F3", "5000");
        let mut scheduler = start(&dir, "7,2026-10-18", ("2026-10-18", "07:00:00"), prices(), sheet).await;

        scheduler.step().await.unwrap();
        let calls = scheduler.prices().marketplace_calls.lock().unwrap().clone();
        assert!(!calls.is_empty());
        assert!(calls.iter().all(|(_, limit)| *limit == Some(dec("5000"))));
    }

    #[tokio::test]
    async fn test_short_day_waits_for_midnight() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last.txt");
        std::fs::write(&path, "7,2026-10-18").unwrap();
        let mut config = AppConfig::default();
        config.buckets.truncate(5); // last boundary 20:00

        let mut scheduler = Scheduler::start(
            &config,
            prices(),
            flagged_sheet(),
            CheckpointStore::new(path),
            ManualClock::at("2026-10-18", "21:30:00"),
        )
        .await
        .unwrap();

        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::Waiting);
        assert_eq!(scheduler.clock.sleeps(), vec![Duration::from_secs(9000)]);
        assert_eq!(scheduler.step().await.unwrap(), SchedulerState::DayDone);
        assert_eq!(scheduler.row(), 8);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let mut scheduler = start(&dir, "7,2026-10-18", ("2026-10-18", "01:00:00"), prices(), flagged_sheet()).await;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        shutdown_tx.send(()).unwrap();

        scheduler.run(shutdown_rx).await.unwrap();
        assert!(scheduler.clock.sleeps().is_empty());
    }
}

//! In-memory sheet store
//!
//! Backs the scheduler in tests and in `--dry-run` mode. Keeps values and
//! highlights in maps guarded by a std mutex; no await happens while the
//! lock is held.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::adapters::errors::SheetResult;
use crate::adapters::sheets::a1::{CellRef, RangeRef};
use crate::adapters::traits::SheetStore;
use crate::adapters::types::CellColor;

#[derive(Debug, Default)]
struct Grid {
    values: HashMap<CellRef, String>,
    /// Cells whose value was written as a number
    numbers: HashSet<CellRef>,
    highlights: HashMap<CellRef, CellColor>,
    clear_count: usize,
}

/// Sheet store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemorySheet {
    grid: Mutex<Grid>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a cell, for assertions
    pub fn value(&self, cell: &str) -> Option<String> {
        let cell = CellRef::parse(cell).ok()?;
        self.lock().values.get(&cell).cloned()
    }

    /// Whether a cell holds a number rather than text
    pub fn is_number(&self, cell: &str) -> bool {
        CellRef::parse(cell).is_ok_and(|cell| self.lock().numbers.contains(&cell))
    }

    /// Highlight color of a cell, for assertions
    pub fn highlight(&self, cell: &str) -> Option<CellColor> {
        let cell = CellRef::parse(cell).ok()?;
        self.lock().highlights.get(&cell).copied()
    }

    /// Every highlighted cell in A1 notation, sorted
    pub fn highlighted_cells(&self) -> Vec<String> {
        let mut cells: Vec<String> = self.lock().highlights.keys().map(|c| c.to_string()).collect();
        cells.sort();
        cells
    }

    /// Number of times `clear` was called
    pub fn clear_count(&self) -> usize {
        self.lock().clear_count
    }

    /// Seed a value directly, bypassing the trait
    pub fn put(&self, cell: &str, value: &str) {
        if let Ok(cell) = CellRef::parse(cell) {
            let mut grid = self.lock();
            grid.numbers.remove(&cell);
            grid.values.insert(cell, value.to_string());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Grid> {
        self.grid.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SheetStore for MemorySheet {
    async fn get_cell(&self, cell: CellRef) -> SheetResult<Option<String>> {
        Ok(self
            .lock()
            .values
            .get(&cell)
            .filter(|v| !v.is_empty())
            .cloned())
    }

    async fn set_cell(&self, cell: CellRef, value: &str) -> SheetResult<()> {
        let mut grid = self.lock();
        grid.numbers.remove(&cell);
        if value.is_empty() {
            grid.values.remove(&cell);
        } else {
            grid.values.insert(cell, value.to_string());
        }
        Ok(())
    }

    async fn set_number(&self, cell: CellRef, value: Decimal) -> SheetResult<()> {
        let mut grid = self.lock();
        grid.numbers.insert(cell);
        grid.values.insert(cell, value.normalize().to_string());
        Ok(())
    }

    async fn get_range(&self, range: RangeRef) -> SheetResult<Vec<Vec<String>>> {
        let grid = self.lock();
        let mut rows = Vec::with_capacity(range.height() as usize);
        for row in range.start.row..=range.end.row {
            let mut values: Vec<String> = (range.start.col..=range.end.col)
                .map(|col| grid.values.get(&CellRef::new(col, row)).cloned().unwrap_or_default())
                .collect();
            // Mirror the Sheets API, which drops trailing empty cells
            while values.last().is_some_and(|v| v.is_empty()) {
                values.pop();
            }
            rows.push(values);
        }
        Ok(rows)
    }

    async fn set_range(&self, range: RangeRef, values: Vec<Vec<String>>) -> SheetResult<()> {
        let mut grid = self.lock();
        for (dy, row_values) in values.into_iter().enumerate() {
            for (dx, value) in row_values.into_iter().enumerate() {
                let cell = CellRef::new(range.start.col + dx as u32, range.start.row + dy as u32);
                grid.numbers.remove(&cell);
                if value.is_empty() {
                    grid.values.remove(&cell);
                } else {
                    grid.values.insert(cell, value);
                }
            }
        }
        Ok(())
    }

    async fn highlight_cell(&self, cell: CellRef, color: CellColor) -> SheetResult<()> {
        self.lock().highlights.insert(cell, color.clamped());
        Ok(())
    }

    async fn clear(&self) -> SheetResult<()> {
        let mut grid = self.lock();
        grid.values.clear();
        grid.numbers.clear();
        grid.highlights.clear();
        grid.clear_count += 1;
        Ok(())
    }
}

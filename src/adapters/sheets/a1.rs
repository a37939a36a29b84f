//! A1 notation for cells and ranges
//!
//! Columns are stored zero-based (`A` = 0), rows one-based as they appear in
//! the sheet. `CellRef::parse("B7")` and `format!("{}", cell)` are inverses.

use std::fmt;
use std::str::FromStr;

use crate::adapters::errors::{SheetError, SheetResult};

/// Single cell address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Zero-based column index
    pub col: u32,
    /// One-based row number
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Build from column letters and a row number (`("B", 7)` → `B7`)
    pub fn from_column(column: &str, row: u32) -> SheetResult<Self> {
        let col = column_index(column)
            .ok_or_else(|| SheetError::InvalidRange(format!("{}{}", column, row)))?;
        if row == 0 {
            return Err(SheetError::InvalidRange(format!("{}{}", column, row)));
        }
        Ok(Self { col, row })
    }

    pub fn parse(s: &str) -> SheetResult<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| SheetError::InvalidRange(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        let row: u32 = digits
            .parse()
            .map_err(|_| SheetError::InvalidRange(s.to_string()))?;
        Self::from_column(letters, row).map_err(|_| SheetError::InvalidRange(s.to_string()))
    }

    /// Column letters of this cell
    pub fn column_name(&self) -> String {
        column_letters(self.col)
    }

    /// Cell `n` columns to the right
    pub fn right(&self, n: u32) -> Self {
        Self::new(self.col + n, self.row)
    }

    /// Cell directly below
    pub fn below(&self) -> Self {
        Self::new(self.col, self.row + 1)
    }

    /// Same column, different row
    pub fn with_row(&self, row: u32) -> Self {
        Self::new(self.col, row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Rectangular range, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    /// Build a range; corners are normalized so `start` is top-left
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.col.min(b.col), a.row.min(b.row)),
            end: CellRef::new(a.col.max(b.col), a.row.max(b.row)),
        }
    }

    pub fn single(cell: CellRef) -> Self {
        Self::new(cell, cell)
    }

    /// Horizontal run of `width` cells starting at `start`
    pub fn row_span(start: CellRef, width: u32) -> Self {
        Self::new(start, start.right(width.saturating_sub(1)))
    }

    pub fn parse(s: &str) -> SheetResult<Self> {
        match s.split_once(':') {
            Some((a, b)) => Ok(Self::new(CellRef::parse(a)?, CellRef::parse(b)?)),
            None => Ok(Self::single(CellRef::parse(s)?)),
        }
    }

    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row)
            .flat_map(move |row| (self.start.col..=self.end.col).map(move |col| CellRef::new(col, row)))
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for RangeRef {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Zero-based column index to letters (`0` → `A`, `26` → `AA`)
pub fn column_letters(col: u32) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Column letters to zero-based index, case-insensitive
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut acc: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(6), "G");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("g"), Some(6));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("B2"), None);
    }

    #[test]
    fn test_parse_cell() {
        let cell = CellRef::parse("B7").unwrap();
        assert_eq!(cell, CellRef::new(1, 7));
        assert_eq!(cell.to_string(), "B7");
        assert_eq!("f3".parse::<CellRef>().unwrap(), CellRef::new(5, 3));
    }

    #[test]
    fn test_parse_cell_invalid() {
        assert!(CellRef::parse("7B").is_err());
        assert!(CellRef::parse("B").is_err());
        assert!(CellRef::parse("B0").is_err());
        assert!(CellRef::parse("").is_err());
    }

    #[test]
    fn test_parse_range() {
        let range = RangeRef::parse("B7:G7").unwrap();
        assert_eq!(range.width(), 6);
        assert_eq!(range.height(), 1);
        assert_eq!(range.to_string(), "B7:G7");

        let single = RangeRef::parse("F2").unwrap();
        assert_eq!(single.width(), 1);
        assert_eq!(single.to_string(), "F2");
    }

    #[test]
    fn test_range_normalized() {
        let range = RangeRef::parse("G7:B6").unwrap();
        assert_eq!(range.to_string(), "B6:G7");
    }

    #[test]
    fn test_row_span_and_cells() {
        let range = RangeRef::row_span(CellRef::new(1, 6), 6);
        assert_eq!(range.to_string(), "B6:G6");
        let cells: Vec<String> = range.cells().map(|c| c.to_string()).collect();
        assert_eq!(cells, vec!["B6", "C6", "D6", "E6", "F6", "G6"]);
    }
}

//! Resume pointer persisted between runs
//!
//! The checkpoint is a single line `row,date` (date as `%Y-%m-%d`). It is
//! rewritten after every cell write and read once at startup. Writes go to
//! a sibling temp file that is then renamed over the target.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Checkpoint file not found: {0} (seed it with --seed)")]
    Missing(String),

    #[error("Malformed checkpoint: {0}")]
    Malformed(String),

    #[error("Checkpoint IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Last allocated row and the day it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub row: u32,
    pub date: NaiveDate,
}

impl Checkpoint {
    pub fn new(row: u32, date: NaiveDate) -> Self {
        Self { row, date }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.date.format(DATE_FORMAT))
    }
}

impl FromStr for Checkpoint {
    type Err = CheckpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (row, date) = line
            .split_once(',')
            .ok_or_else(|| CheckpointError::Malformed(format!("expected 'row,date', got '{}'", line)))?;

        let row: u32 = row
            .trim()
            .parse()
            .map_err(|_| CheckpointError::Malformed(format!("invalid row '{}'", row.trim())))?;
        if row == 0 {
            return Err(CheckpointError::Malformed("row must be >= 1".to_string()));
        }

        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|_| CheckpointError::Malformed(format!("invalid date '{}'", date.trim())))?;

        Ok(Self { row, date })
    }
}

/// File-backed checkpoint storage
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored pointer; absence or malformation is an error
    pub async fn load(&self) -> Result<Checkpoint, CheckpointError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::Missing(self.path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let checkpoint: Checkpoint = content.parse()?;
        debug!(path = %self.path.display(), row = checkpoint.row, date = %checkpoint.date, "Checkpoint loaded");
        Ok(checkpoint)
    }

    /// Replace the stored pointer
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, format!("{}\n", checkpoint)).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), row = checkpoint.row, date = %checkpoint.date, "Checkpoint saved");
        Ok(())
    }

    /// Write an initial pointer before the first run
    pub async fn seed(&self, row: u32, date: NaiveDate) -> Result<Checkpoint, CheckpointError> {
        if row == 0 {
            return Err(CheckpointError::Malformed("row must be >= 1".to_string()));
        }
        let checkpoint = Checkpoint::new(row, date);
        self.save(&checkpoint).await?;
        info!(path = %self.path.display(), row, date = %date, "Checkpoint seeded");
        Ok(checkpoint)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_display_format() {
        let checkpoint = Checkpoint::new(12, date("2026-10-18"));
        assert_eq!(checkpoint.to_string(), "12,2026-10-18");
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let checkpoint: Checkpoint = " 9 , 2026-01-31 \n".parse().unwrap();
        assert_eq!(checkpoint, Checkpoint::new(9, date("2026-01-31")));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "7", "seven,2026-10-18", "7,18.10", "0,2026-10-18", "-3,2026-10-18"] {
            let err = input.parse::<Checkpoint>().unwrap_err();
            assert!(matches!(err, CheckpointError::Malformed(_)), "input {:?}", input);
        }
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("last.txt"));

        let checkpoint = Checkpoint::new(15, date("2026-10-18"));
        store.save(&checkpoint).await.unwrap();
        assert_eq!(store.load().await.unwrap(), checkpoint);

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "15,2026-10-18\n");
        assert!(!dir.path().join("last.txt.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("last.txt"));

        store.save(&Checkpoint::new(120, date("2026-10-17"))).await.unwrap();
        store.save(&Checkpoint::new(8, date("2026-10-18"))).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "8,2026-10-18\n"
        );
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("absent.txt"));
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CheckpointError::Missing(_)));
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last.txt");
        // date,column,row instead of row,date
        std::fs::write(&path, "18.10,B,7").unwrap();

        let err = CheckpointStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, CheckpointError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_seed() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("last.txt"));

        let seeded = store.seed(7, date("2026-10-18")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), seeded);
        assert!(store.seed(0, date("2026-10-18")).await.is_err());
    }
}

//! Google Sheets configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::constants;

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com";

/// Where the recording grid lives and how to authenticate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Spreadsheet id; when absent the spreadsheet is looked up by name
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// Spreadsheet (workbook) title, e.g. "binance"
    #[serde(default = "default_spreadsheet_name")]
    pub spreadsheet_name: String,
    /// Worksheet (tab) title, e.g. "main"
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    /// Path to the service-account JSON key
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    #[serde(default = "default_sheets_base_url")]
    pub sheets_base_url: String,
    #[serde(default = "default_drive_base_url")]
    pub drive_base_url: String,
}

fn default_spreadsheet_name() -> String {
    "binance".to_string()
}

fn default_worksheet() -> String {
    "main".to_string()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("service_account.json")
}

fn default_sheets_base_url() -> String {
    DEFAULT_SHEETS_BASE_URL.to_string()
}

fn default_drive_base_url() -> String {
    DEFAULT_DRIVE_BASE_URL.to_string()
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            spreadsheet_name: default_spreadsheet_name(),
            worksheet: default_worksheet(),
            credentials_path: default_credentials_path(),
            sheets_base_url: default_sheets_base_url(),
            drive_base_url: default_drive_base_url(),
        }
    }
}

impl SheetsConfig {
    /// Apply `SPREADSHEET_NAME` / `GOOGLE_CREDENTIALS_PATH` overrides
    pub fn apply_env_overrides(&mut self) {
        if let Some(name) = constants::spreadsheet_name_override() {
            self.spreadsheet_name = name;
        }
        if let Some(path) = constants::credentials_path_override() {
            self.credentials_path = path;
        }
    }
}

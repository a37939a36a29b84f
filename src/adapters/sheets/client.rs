//! Google Sheets v4 store
//!
//! Implements `SheetStore` on top of the Sheets REST API. Values go through
//! `values.get` / `values.update`; highlight and clear go through
//! `batchUpdate` and need the numeric sheet id, which is resolved once in
//! `connect`.
//!
//! Writes use `valueInputOption=RAW` so the spreadsheet locale never
//! reinterprets them: text stays text and numbers are sent as JSON numbers.
//! Reads use `UNFORMATTED_VALUE`, so numbers arrive without grouping or
//! locale separators.

use async_trait::async_trait;
use reqwest::{Response, Url};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::adapters::errors::{SheetError, SheetResult};
use crate::adapters::sheets::a1::{CellRef, RangeRef};
use crate::adapters::sheets::auth::{ServiceAccountKey, TokenProvider};
use crate::adapters::sheets::config::SheetsConfig;
use crate::adapters::traits::SheetStore;
use crate::adapters::types::CellColor;
use crate::config::constants;

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
];

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Sheet store backed by a Google spreadsheet worksheet
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    sheets_base_url: String,
    spreadsheet_id: String,
    worksheet: String,
    sheet_id: i64,
}

impl GoogleSheetsClient {
    /// Authenticate with the configured key file and locate the worksheet
    pub async fn connect(config: &SheetsConfig) -> SheetResult<Self> {
        let key = ServiceAccountKey::from_file(&config.credentials_path)?;
        Self::connect_with_key(config, key).await
    }

    pub async fn connect_with_key(config: &SheetsConfig, key: ServiceAccountKey) -> SheetResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(constants::http_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let tokens = TokenProvider::new(key, SCOPES, http.clone());

        info!(
            client_email = %tokens.client_email(),
            spreadsheet = %config.spreadsheet_name,
            worksheet = %config.worksheet,
            "Connecting to Google Sheets"
        );

        let spreadsheet_id = match &config.spreadsheet_id {
            Some(id) => id.clone(),
            None => find_spreadsheet_id(&http, &tokens, &config.drive_base_url, &config.spreadsheet_name).await?,
        };

        let mut client = Self {
            http,
            tokens,
            sheets_base_url: config.sheets_base_url.trim_end_matches('/').to_string(),
            spreadsheet_id,
            worksheet: config.worksheet.clone(),
            sheet_id: 0,
        };
        client.sheet_id = client.resolve_sheet_id().await?;

        info!(
            spreadsheet_id = %client.spreadsheet_id,
            sheet_id = client.sheet_id,
            "Worksheet located"
        );

        Ok(client)
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn sheet_id(&self) -> i64 {
        self.sheet_id
    }

    /// `'main'!B7:G7`, quoting the worksheet title
    fn qualified(&self, range: &RangeRef) -> String {
        format!("'{}'!{}", self.worksheet.replace('\'', "''"), range)
    }

    fn endpoint(&self, tail: &[&str]) -> SheetResult<Url> {
        let mut url = Url::parse(&self.sheets_base_url)
            .map_err(|e| SheetError::InvalidResponse(format!("Invalid Sheets base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::InvalidResponse("Sheets base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(tail);
        Ok(url)
    }

    async fn resolve_sheet_id(&self) -> SheetResult<i64> {
        let url = self.endpoint(&[&self.spreadsheet_id])?;
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties(sheetId,title)")])
            .send()
            .await?;

        let meta: SpreadsheetMeta = parse_json(check_status(response).await?).await?;
        meta.sheets
            .into_iter()
            .map(|s| s.properties)
            .find(|p| p.title == self.worksheet)
            .map(|p| p.sheet_id)
            .ok_or_else(|| SheetError::NotFound(format!("worksheet '{}'", self.worksheet)))
    }

    /// PUT `values` into `range` without locale parsing
    async fn update_values(&self, range: &RangeRef, values: Value) -> SheetResult<()> {
        let qualified = self.qualified(range);
        let url = self.endpoint(&[&self.spreadsheet_id, "values", &qualified])?;
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({
                "range": qualified,
                "majorDimension": "ROWS",
                "values": values,
            }))
            .send()
            .await?;
        check_status(response).await?;
        debug!(range = %qualified, "Range updated");
        Ok(())
    }

    async fn batch_update(&self, requests: Value) -> SheetResult<()> {
        let segment = format!("{}:batchUpdate", self.spreadsheet_id);
        let url = self.endpoint(&[&segment])?;
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Look a spreadsheet up by title through the Drive files search
async fn find_spreadsheet_id(
    http: &reqwest::Client,
    tokens: &TokenProvider,
    drive_base_url: &str,
    name: &str,
) -> SheetResult<String> {
    let query = format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        name.replace('\\', "\\\\").replace('\'', "\\'"),
        SPREADSHEET_MIME_TYPE
    );
    let url = format!("{}/drive/v3/files", drive_base_url.trim_end_matches('/'));
    let token = tokens.access_token().await?;

    let response = http
        .get(url)
        .bearer_auth(token)
        .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
        .send()
        .await?;

    let list: DriveFileList = parse_json(check_status(response).await?).await?;
    let file = list
        .files
        .into_iter()
        .next()
        .ok_or_else(|| SheetError::NotFound(format!("spreadsheet '{}'", name)))?;

    debug!(id = %file.id, name = %file.name, "Spreadsheet found by name");
    Ok(file.id)
}

async fn check_status(response: Response) -> SheetResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
    Err(SheetError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> SheetResult<T> {
    let text = response.text().await?;
    serde_json::from_str(&text)
        .map_err(|e| SheetError::InvalidResponse(format!("Invalid JSON: {} - {}", e, text)))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn number_value(value: Decimal) -> SheetResult<Value> {
    value
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| SheetError::InvalidValue(format!("{} is not representable as a number", value)))
}

fn grid_range(sheet_id: i64, cell: CellRef) -> Value {
    json!({
        "sheetId": sheet_id,
        "startRowIndex": cell.row - 1,
        "endRowIndex": cell.row,
        "startColumnIndex": cell.col,
        "endColumnIndex": cell.col + 1,
    })
}

#[async_trait]
impl SheetStore for GoogleSheetsClient {
    async fn get_cell(&self, cell: CellRef) -> SheetResult<Option<String>> {
        let rows = self.get_range(RangeRef::single(cell)).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .filter(|v| !v.is_empty()))
    }

    async fn set_cell(&self, cell: CellRef, value: &str) -> SheetResult<()> {
        self.set_range(RangeRef::single(cell), vec![vec![value.to_string()]])
            .await
    }

    async fn set_number(&self, cell: CellRef, value: Decimal) -> SheetResult<()> {
        let number = number_value(value)?;
        self.update_values(&RangeRef::single(cell), json!([[number]]))
            .await
    }

    async fn get_range(&self, range: RangeRef) -> SheetResult<Vec<Vec<String>>> {
        let qualified = self.qualified(&range);
        let url = self.endpoint(&[&self.spreadsheet_id, "values", &qualified])?;
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("majorDimension", "ROWS"), ("valueRenderOption", "UNFORMATTED_VALUE")])
            .send()
            .await?;

        let body: ValueRange = parse_json(check_status(response).await?).await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn set_range(&self, range: RangeRef, values: Vec<Vec<String>>) -> SheetResult<()> {
        self.update_values(&range, json!(values)).await
    }

    async fn highlight_cell(&self, cell: CellRef, color: CellColor) -> SheetResult<()> {
        let color = color.clamped();
        self.batch_update(json!([{
            "repeatCell": {
                "range": grid_range(self.sheet_id, cell),
                "cell": {
                    "userEnteredFormat": {
                        "backgroundColor": {
                            "red": color.red,
                            "green": color.green,
                            "blue": color.blue,
                        }
                    }
                },
                "fields": "userEnteredFormat.backgroundColor",
            }
        }]))
        .await
    }

    async fn clear(&self) -> SheetResult<()> {
        self.batch_update(json!([{
            "updateCells": {
                "range": { "sheetId": self.sheet_id },
                "fields": "*",
            }
        }]))
        .await?;
        info!(worksheet = %self.worksheet, "Worksheet cleared");
        Ok(())
    }
}

//! Access to the shared spreadsheet the tally is pulled from.
//!
//! The job only needs two capabilities from the remote side: the list of
//! worksheet titles, and the values of one column of one worksheet. Both are
//! captured by [`SheetSource`], which is implemented for the Google Sheets
//! REST API and for a local `.xlsx` file.

use std::path::PathBuf;

use calamine::{Reader, Xlsx, open_workbook};
use chrono::NaiveDate;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::tally::error::{Result, TallyError};
use crate::tally::io::excel_read::to_cell;

/// Default endpoint of the Sheets v4 REST API.
pub const GOOGLE_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4";

/// Read access to a titled collection of worksheets.
pub trait SheetSource {
    /// Worksheet titles in the order the spreadsheet lists them.
    fn worksheet_titles(&mut self) -> Result<Vec<String>>;

    /// Values of the 1-based `column` of `worksheet`, starting at row 1.
    ///
    /// Trailing empty cells are not returned, so the result may be shorter
    /// than the sheet.
    fn column_values(&mut self, worksheet: &str, column: u32) -> Result<Vec<String>>;
}

/// The `MM.DD` pattern used to find the worksheet for `date`.
pub fn worksheet_pattern(date: NaiveDate) -> String {
    date.format("%m.%d").to_string()
}

/// Returns the first title containing the `MM.DD` pattern for `date`.
///
/// When several titles match, the first one in scan order wins.
pub fn select_worksheet(titles: &[String], date: NaiveDate) -> Result<String> {
    let pattern = worksheet_pattern(date);
    titles
        .iter()
        .find(|title| title.contains(&pattern))
        .cloned()
        .ok_or(TallyError::WorksheetNotFound(pattern))
}

/// Converts a 1-based column index into its spreadsheet letters (`5` → `E`).
pub fn column_letter(column: u32) -> String {
    let mut letters = Vec::new();
    let mut remaining = column;
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Extracts the spreadsheet id from a share link, or returns the input when it
/// already is a bare id.
pub fn spreadsheet_id_from_url(reference: &str) -> String {
    let reference = reference.trim();
    match reference.split_once("/spreadsheets/d/") {
        Some((_, rest)) => rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
        None => reference.to_string(),
    }
}

fn trim_trailing_blanks(values: &mut Vec<String>) {
    while values.last().is_some_and(|value| value.is_empty()) {
        values.pop();
    }
}

/// How requests to the Sheets API are authorised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OAuth access token sent as `Authorization: Bearer`.
    BearerToken(String),
    /// API key sent as the `key` query parameter; only works for sheets shared
    /// publicly.
    ApiKey(String),
}

impl Credentials {
    /// Reads credentials from the named environment variables, preferring the
    /// bearer token.
    pub fn from_env(token_var: &str, api_key_var: &str) -> Result<Self> {
        let lookup = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(token) = lookup(token_var) {
            return Ok(Credentials::BearerToken(token));
        }
        if let Some(key) = lookup(api_key_var) {
            return Ok(Credentials::ApiKey(key));
        }
        Err(TallyError::MissingCredentials(format!(
            "set {token_var} or {api_key_var}"
        )))
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::BearerToken(token) => request.bearer_auth(token),
            Credentials::ApiKey(key) => request.query(&[("key", key)]),
        }
    }
}

/// [`SheetSource`] backed by the Google Sheets v4 REST API.
pub struct GoogleSheetsSource {
    client: Client,
    endpoint: String,
    spreadsheet_id: String,
    credentials: Credentials,
}

impl GoogleSheetsSource {
    pub fn new(spreadsheet: &str, credentials: Credentials) -> Result<Self> {
        Self::with_endpoint(GOOGLE_SHEETS_ENDPOINT, spreadsheet, credentials)
    }

    pub fn with_endpoint(endpoint: &str, spreadsheet: &str, credentials: Credentials) -> Result<Self> {
        let spreadsheet_id = spreadsheet_id_from_url(spreadsheet);
        if spreadsheet_id.is_empty() {
            return Err(TallyError::Configuration(
                "spreadsheet id or share link is required".into(),
            ));
        }
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            spreadsheet_id,
            credentials,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let invalid = || TallyError::Configuration(format!("invalid endpoint '{}'", self.endpoint));
        let mut url = Url::parse(&self.endpoint).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("spreadsheets")
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    fn get<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        let request = self.credentials.apply(self.client.get(url).query(query));
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TallyError::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>()?)
    }
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

/// Body of a `values.get` response.
#[derive(Debug, Default, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// A1 range covering the whole of `column` on `worksheet`, e.g. `'01.20'!E:E`.
/// Quotes inside the title are doubled.
pub fn column_range(worksheet: &str, column: u32) -> String {
    let letter = column_letter(column);
    format!("'{}'!{letter}:{letter}", worksheet.replace('\'', "''"))
}

/// Cell texts of the first column of a `majorDimension=COLUMNS` response,
/// without trailing blanks.
pub fn column_from_value_range(body: ValueRange) -> Vec<String> {
    let mut values: Vec<String> = body
        .values
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(value_to_text)
        .collect();
    trim_trailing_blanks(&mut values);
    values
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetSource for GoogleSheetsSource {
    #[instrument(level = "debug", skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    fn worksheet_titles(&mut self) -> Result<Vec<String>> {
        let url = self.url(&[])?;
        let meta: SpreadsheetMeta = self.get(url, &[("fields", "sheets.properties.title")])?;
        let titles: Vec<String> = meta
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect();
        debug!(worksheet_count = titles.len(), "listed remote worksheets");
        Ok(titles)
    }

    #[instrument(level = "debug", skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    fn column_values(&mut self, worksheet: &str, column: u32) -> Result<Vec<String>> {
        let range = column_range(worksheet, column);
        let url = self.url(&["values", &range])?;
        let body: ValueRange = self.get(url, &[("majorDimension", "COLUMNS")])?;
        let values = column_from_value_range(body);
        debug!(cell_count = values.len(), "fetched remote column");
        Ok(values)
    }
}

/// [`SheetSource`] reading a local workbook, for offline runs.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(TallyError::MissingInput(path));
        }
        Ok(Self { path })
    }
}

impl SheetSource for WorkbookSource {
    fn worksheet_titles(&mut self) -> Result<Vec<String>> {
        let workbook: Xlsx<_> = open_workbook(&self.path)?;
        Ok(workbook.sheet_names().to_vec())
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn column_values(&mut self, worksheet: &str, column: u32) -> Result<Vec<String>> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path)?;
        let range = workbook
            .worksheet_range(worksheet)
            .ok_or_else(|| TallyError::WorksheetNotFound(worksheet.to_string()))??;
        let col = column.saturating_sub(1);
        let last_row = range.end().map(|(row, _)| row + 1).unwrap_or(0);

        let mut values: Vec<String> = (0..last_row)
            .map(|row| to_cell(range.get_value((row, col))).to_text())
            .collect();
        trim_trailing_blanks(&mut values);
        debug!(cell_count = values.len(), "read local column");
        Ok(values)
    }
}

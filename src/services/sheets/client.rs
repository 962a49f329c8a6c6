use std::time::Duration;

use reqwest::StatusCode;

use crate::error::ReconcileError;
use crate::ports::ledger::RemoteLedger;
use crate::services::sheets::types::{DriveFileList, SpreadsheetMetadata, ValueRange};

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";
const SERVICE: &str = "Google Sheets";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The first worksheet of a spreadsheet, addressed through the Sheets v4 values API.
pub struct GoogleSheet {
    client: reqwest::Client,
    access_token: String,
    spreadsheet_name: String,
    spreadsheet_id: String,
    worksheet: String,
}

impl GoogleSheet {
    /// Find the spreadsheet called `name` and bind to its first worksheet.
    #[tracing::instrument(skip(access_token))]
    pub async fn open(access_token: &str, name: &str) -> Result<Self, ReconcileError> {
        let client = reqwest::Client::new();
        let not_found = || ReconcileError::RemoteNotFound {
            name: name.to_string(),
        };

        let url = format!(
            "{}?q={}&fields={}&pageSize=1",
            DRIVE_FILES_URL,
            urlencoding::encode(&drive_query(name)),
            urlencoding::encode("files(id,name)")
        );
        let response = send(
            client.get(&url).bearer_auth(access_token),
            "find spreadsheet",
            name,
        )
        .await?;
        let files: DriveFileList = parse(response, "find spreadsheet").await?;
        let file = files.files.into_iter().next().ok_or_else(not_found)?;
        tracing::debug!("Found spreadsheet '{}' ({})", file.name, file.id);

        let url = format!(
            "{}/{}?fields={}",
            SHEETS_API_URL,
            file.id,
            urlencoding::encode("sheets.properties.title")
        );
        let response = send(
            client.get(&url).bearer_auth(access_token),
            "read spreadsheet metadata",
            name,
        )
        .await?;
        let metadata: SpreadsheetMetadata = parse(response, "read spreadsheet metadata").await?;
        let worksheet = metadata
            .sheets
            .into_iter()
            .next()
            .map(|sheet| sheet.properties.title)
            .ok_or_else(not_found)?;

        Ok(Self {
            client,
            access_token: access_token.to_string(),
            spreadsheet_name: name.to_string(),
            spreadsheet_id: file.id,
            worksheet,
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_API_URL,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }
}

#[async_trait::async_trait]
impl RemoteLedger for GoogleSheet {
    async fn get_all_rows(&self) -> Result<Vec<Vec<String>>, ReconcileError> {
        let url = self.values_url(&quote_sheet_name(&self.worksheet));
        let response = send(
            self.client.get(&url).bearer_auth(&self.access_token),
            "read rows",
            &self.spreadsheet_name,
        )
        .await?;
        let values: ValueRange = parse(response, "read rows").await?;
        tracing::debug!("Read {} rows from '{}'", values.values.len(), self.worksheet);
        Ok(values.values)
    }

    async fn append_row(&self, row: Vec<String>) -> Result<(), ReconcileError> {
        let range = format!("{}!A1", quote_sheet_name(&self.worksheet));
        let url = format!(
            "{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.values_url(&range)
        );
        let body = ValueRange {
            range: None,
            values: vec![row],
        };
        send(
            self.client
                .post(&url)
                .bearer_auth(&self.access_token)
                .json(&body),
            "append row",
            &self.spreadsheet_name,
        )
        .await?;
        Ok(())
    }

    async fn update_cell(
        &self,
        row: usize,
        column: usize,
        value: &str,
    ) -> Result<(), ReconcileError> {
        let range = format!(
            "{}!{}",
            quote_sheet_name(&self.worksheet),
            a1_cell(row, column)
        );
        let url = format!("{}?valueInputOption=RAW", self.values_url(&range));
        let body = ValueRange {
            range: Some(range),
            values: vec![vec![value.to_string()]],
        };
        send(
            self.client
                .put(&url)
                .bearer_auth(&self.access_token)
                .json(&body),
            "update cell",
            &self.spreadsheet_name,
        )
        .await?;
        Ok(())
    }
}

async fn send(
    request: reqwest::RequestBuilder,
    operation: &str,
    spreadsheet_name: &str,
) -> Result<reqwest::Response, ReconcileError> {
    let response = request
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|e| remote_error(operation, e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error text".to_string());
    Err(status_error(status, body, operation, spreadsheet_name))
}

async fn parse<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> Result<T, ReconcileError> {
    response
        .json()
        .await
        .map_err(|e| remote_error(operation, format!("Failed to parse response: {}", e)))
}

fn remote_error(operation: &str, error_message: String) -> ReconcileError {
    ReconcileError::Remote {
        service: SERVICE.to_string(),
        operation: operation.to_string(),
        error_message,
    }
}

fn status_error(
    status: StatusCode,
    body: String,
    operation: &str,
    spreadsheet_name: &str,
) -> ReconcileError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReconcileError::RemoteAuth {
            service: SERVICE.to_string(),
            reason: format!("{} during {}", status, operation),
        },
        StatusCode::NOT_FOUND => ReconcileError::RemoteNotFound {
            name: spreadsheet_name.to_string(),
        },
        _ => remote_error(operation, format!("{}: {}", status, body)),
    }
}

/// Drive search for a non-trashed spreadsheet with exactly this name.
fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME_TYPE
    )
}

/// Worksheet name quoted for use in an A1 range.
fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// A1 address of a 1-based (row, column), e.g. (8, 7) -> "G8".
fn a1_cell(row: usize, column: usize) -> String {
    format!("{}{}", column_letters(column), row)
}

fn column_letters(column: usize) -> String {
    let mut letters = Vec::new();
    let mut n = column;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

//! Google Sheets sink
//!
//! Talks to the Sheets v4 values API with a bearer access token. Rows go to
//! the first worksheet, which is what an unqualified `A1` range refers to.

use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

use crate::export::{ExportError, TabularSink};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Extract the spreadsheet id from a `.../spreadsheets/d/<id>/...` URL
pub fn spreadsheet_id_from_url(sheet_url: &str) -> Result<String, ExportError> {
    let invalid = || ExportError::InvalidSheetUrl(sheet_url.to_string());

    let parsed = Url::parse(sheet_url).map_err(|_| invalid())?;
    let segments: Vec<&str> = parsed.path_segments().ok_or_else(invalid)?.collect();

    segments
        .windows(3)
        .find(|w| w[0] == "spreadsheets" && w[1] == "d" && !w[2].is_empty())
        .map(|w| w[2].to_string())
        .ok_or_else(invalid)
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Sink appending to the first worksheet of a spreadsheet
#[derive(Clone)]
pub struct SheetsSink {
    client: ReqwestClient,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
}

#[cfg(test)]
impl SheetsSink {
    /// Set the base URL (for testing only)
    pub fn set_base_url(&mut self, url: String) {
        self.base_url = url;
    }
}

impl SheetsSink {
    /// Create a sink for the spreadsheet at `sheet_url`
    pub fn new(sheet_url: &str, access_token: impl Into<String>) -> Result<Self, ExportError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(ExportError::Auth(
                "No access token configured for Google Sheets".to_string(),
            ));
        }

        Ok(Self {
            client: ReqwestClient::new(),
            base_url: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id_from_url(sheet_url)?,
            access_token,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url, self.spreadsheet_id, range
        )
    }

    async fn check(response: Response) -> Result<Response, ExportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ExportError::Auth(message)),
            _ => Err(ExportError::Api {
                status_code: status.as_u16(),
                message,
            }),
        }
    }
}

impl TabularSink for SheetsSink {
    #[instrument(skip(self), level = "debug")]
    async fn header_present(&mut self) -> Result<bool, ExportError> {
        let response = self
            .client
            .get(self.values_url("A1"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let range: ValueRange = Self::check(response).await?.json().await?;

        let present = range
            .values
            .first()
            .and_then(|row| row.first())
            .is_some_and(|cell| match cell {
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                _ => true,
            });
        debug!("Header present: {}", present);
        Ok(present)
    }

    async fn append_row(&mut self, row: Vec<String>) -> Result<(), ExportError> {
        self.append_rows(vec![row]).await
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()), level = "debug")]
    async fn append_rows(&mut self, rows: Vec<Vec<String>>) -> Result<(), ExportError> {
        let response = self
            .client
            .post(self.values_url("A1:append"))
            .bearer_auth(&self.access_token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

//! Implements the `Sheet` trait using the `sheets::Client` to interact with a Google sheet.

use crate::api::{a1, Sheet, SheetRange};
use crate::error::Res;
use crate::{utils, Config};
use anyhow::{ensure, Context};
use serde::Deserialize;
use sheets::types::{
    BatchClearValuesRequest, BatchUpdateValuesRequest, DateTimeRenderOption, Dimension,
    ValueInputOption, ValueRange, ValueRenderOption,
};
use sheets::ClientError;
use std::path::Path;
use tracing::trace;

/// The part of the token file that is needed. Obtaining and refreshing the token is left to
/// whatever wrote the file.
#[derive(Debug, Deserialize)]
struct TokenFile {
    access_token: String,
}

/// Implements the `Sheet` trait over the Google Sheets API using an access token read from the
/// configured token file.
pub(super) struct GoogleSheet {
    spreadsheet_id: String,
    client: sheets::Client,
}

impl GoogleSheet {
    pub(super) async fn new(config: &Config) -> Res<Self> {
        let spreadsheet_id = config.require_spreadsheet_id()?.to_string();
        let access_token = read_access_token(&config.token_path()).await?;
        Ok(Self {
            spreadsheet_id,
            client: create_sheets_client(access_token),
        })
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn get(&mut self, sheet_name: &str) -> Res<Vec<Vec<String>>> {
        trace!("get for {sheet_name}");
        let range = a1(sheet_name, "A:ZZ");
        let response = self
            .client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                &range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch {sheet_name} sheet data"))?;
        Ok(response.body.values)
    }

    async fn clear_ranges(&mut self, ranges: &[&str]) -> Res<()> {
        trace!("clear_ranges for {ranges:?}");
        let request = BatchClearValuesRequest {
            ranges: ranges.iter().map(|s| s.to_string()).collect(),
        };
        self.client
            .spreadsheets()
            .values_batch_clear(&self.spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to clear ranges: {ranges:?}"))?;
        Ok(())
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Res<()> {
        trace!("write_ranges for {} ranges", data.len());
        let value_ranges: Vec<ValueRange> = data
            .iter()
            .map(|sr| ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: sr.range.clone(),
                values: sr.values.clone(),
            })
            .collect();

        let request = BatchUpdateValuesRequest {
            data: value_ranges,
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };

        self.client
            .spreadsheets()
            .values_batch_update(&self.spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .context("Failed to write ranges")?;
        Ok(())
    }
}

async fn read_access_token(path: &Path) -> Res<String> {
    let token: TokenFile = utils::deserialize(path).await.with_context(|| {
        format!(
            "Unable to read a Google access token from {}, see token_path in config.json",
            path.display()
        )
    })?;
    ensure!(
        !token.access_token.trim().is_empty(),
        "The access token in {} is empty",
        path.display()
    );
    Ok(token.access_token)
}

/// Creates a sheets client that uses `access_token` for every request.
fn create_sheets_client(access_token: String) -> sheets::Client {
    // Only the access token is needed for API calls; client id, secret, redirect and refresh
    // token stay empty.
    sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token,
        String::new(),
    )
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_access_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        utils::write(&path, r#"{"access_token": "ya29.abc", "expires_in": 3599}"#)
            .await
            .unwrap();
        assert_eq!(read_access_token(&path).await.unwrap(), "ya29.abc");
    }

    #[tokio::test]
    async fn test_read_access_token_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_access_token(&dir.path().join("token.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("token_path"));
    }

    #[tokio::test]
    async fn test_read_access_token_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        utils::write(&path, r#"{"access_token": " "}"#).await.unwrap();
        assert!(read_access_token(&path).await.is_err());
    }
}

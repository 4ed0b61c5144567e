//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::{SheetData, TestSheet};
use crate::state::AppState;
use crate::Config;
use chrono::NaiveDate;
use std::str::FromStr;
use tempfile::TempDir;

/// Test environment that sets up a pos home directory with a `Config`. Holds the `TempDir` to
/// keep the directory alive for the duration of the test.
pub(crate) struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a home directory whose sheet URL points at a spreadsheet ID unique to this
    /// environment, so `TestSheet` state never leaks between tests.
    pub(crate) async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("pos");
        let id = temp_dir
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .replace(['.', '-'], "");
        let sheet_url = format!("https://docs.google.com/spreadsheets/d/{id}/edit");
        let config = Config::create(&root, &sheet_url).await.unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    pub(crate) fn config(&self) -> Config {
        self.config.clone()
    }

    /// Loads the current state from the files in this environment.
    pub(crate) async fn state(&self) -> AppState {
        AppState::load(&self.config).await.unwrap()
    }

    /// Gets the current contents of the `TestSheet` associated with this environment.
    pub(crate) fn get_sheet(&self) -> SheetData {
        TestSheet::new(self.config.spreadsheet_id()).get_state()
    }

    /// Replaces the contents of the `TestSheet` associated with this environment.
    pub(crate) fn set_sheet(&self, data: SheetData) {
        TestSheet::new(self.config.spreadsheet_id()).set_state(data)
    }
}

/// Parses a `YYYY-MM-DD` date.
pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::from_str(s).unwrap()
}

/// Turns string literals into sheet rows.
pub(crate) fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
    data.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

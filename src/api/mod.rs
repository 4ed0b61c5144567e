//! The spreadsheet adapter.
//!
//! `Sheet` is a small interface over a spreadsheet: read a tab, clear ranges, write
//! ranges. `GoogleSheet` implements it against the Google Sheets API and `TestSheet` implements it
//! in memory. The `layout` module knows the shapes of the price and sales tabs.

mod google;
pub(crate) mod layout;
mod test_sheet;

use crate::error::Res;
use crate::Config;
use google::GoogleSheet;
use tracing::debug;

#[cfg(test)]
pub(crate) use test_sheet::SheetData;
pub(crate) use test_sheet::TestSheet;

/// When this environment variable is set and non-empty, `Mode::from_env` returns `Mode::Test`.
pub const TEST_MODE_ENV: &str = "POS_SALES_IN_TEST_MODE";

/// A rectangle of values to be written, starting at the cell named by `range`, e.g.
/// `Sales_data!A12`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct SheetRange {
    pub(crate) range: String,
    pub(crate) values: Vec<Vec<String>>,
}

/// The operations needed from a spreadsheet.
#[async_trait::async_trait]
pub(crate) trait Sheet {
    /// Gets every row of the tab named `sheet_name` as formatted strings. Trailing empty cells may
    /// be missing from a row.
    async fn get(&mut self, sheet_name: &str) -> Res<Vec<Vec<String>>>;

    /// Clears the values in the given A1 ranges, e.g. `December!A:B`.
    async fn clear_ranges(&mut self, ranges: &[&str]) -> Res<()>;

    /// Writes each range's values, interpreting them as if a user had typed them.
    async fn write_ranges(&mut self, data: &[SheetRange]) -> Res<()>;
}

/// Which `Sheet` implementation `sheet` hands out.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    /// Returns `Mode::Test` when `POS_SALES_IN_TEST_MODE` is set and non-empty. This allows the
    /// whole program to run without touching the Google APIs.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Creates the `Sheet` for the spreadsheet configured in `config`.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Res<Box<dyn Sheet + Send>> {
    let spreadsheet_id = config.require_spreadsheet_id()?;
    debug!("Using {mode:?} sheet for spreadsheet {spreadsheet_id}");
    Ok(match mode {
        Mode::Google => Box::new(GoogleSheet::new(config).await?),
        Mode::Test => Box::new(TestSheet::new(spreadsheet_id)),
    })
}

/// Builds an A1 range such as `'Sales_data'!A12`, quoting the tab name.
pub(crate) fn a1(tab: &str, cells: &str) -> String {
    format!("'{}'!{cells}", tab.replace('\'', "''"))
}

/// Splits an A1 range such as `Sales_data!B12` or `December!A:B` into the tab name and the part
/// after the `!`. A range without a `!` names a whole tab.
pub(crate) fn split_range(range: &str) -> (&str, &str) {
    match range.rsplit_once('!') {
        Some((tab, cells)) => (tab.trim_matches('\''), cells),
        None => (range, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_range() {
        assert_eq!(split_range("Sales_data!A12"), ("Sales_data", "A12"));
        assert_eq!(split_range("'My Tab'!A:B"), ("My Tab", "A:B"));
        assert_eq!(split_range("December"), ("December", ""));
    }

    #[test]
    fn test_a1() {
        assert_eq!(a1("Sales_data", "A12"), "'Sales_data'!A12");
        assert_eq!(a1("Bob's", "A:B"), "'Bob''s'!A:B");
        assert_eq!(split_range(&a1("December", "A1")), ("December", "A1"));
    }
}

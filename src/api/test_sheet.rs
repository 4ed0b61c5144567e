//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.

use crate::api::{split_range, Sheet, SheetRange};
use crate::config::{PRICE_SHEET, SALES_SHEET};
use crate::error::Res;
use anyhow::{bail, Context};
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

/// The rows of every tab, keyed by tab name.
pub(crate) type SheetData = BTreeMap<String, Vec<Vec<String>>>;

/// Spreadsheets by ID. Each `TestSheet` is a handle into this map so that separate handles to the
/// same spreadsheet ID see each other's writes, as they would with a real spreadsheet.
static SPREADSHEETS: LazyLock<Mutex<HashMap<String, SheetData>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn spreadsheets() -> MutexGuard<'static, HashMap<String, SheetData>> {
    SPREADSHEETS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An implementation of the `Sheet` trait that does not use Google sheets. A spreadsheet ID seen
/// for the first time is seeded with sample price and sales tabs.
pub(crate) struct TestSheet {
    spreadsheet_id: String,
}

impl TestSheet {
    pub(crate) fn new(spreadsheet_id: impl Into<String>) -> Self {
        let spreadsheet_id = spreadsheet_id.into();
        spreadsheets()
            .entry(spreadsheet_id.clone())
            .or_insert_with(default_data);
        Self { spreadsheet_id }
    }

    #[cfg(test)]
    pub(crate) fn get_state(&self) -> SheetData {
        spreadsheets()
            .get(&self.spreadsheet_id)
            .cloned()
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, data: SheetData) {
        let _ = spreadsheets().insert(self.spreadsheet_id.clone(), data);
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self, sheet_name: &str) -> Res<Vec<Vec<String>>> {
        spreadsheets()
            .get(&self.spreadsheet_id)
            .and_then(|tabs| tabs.get(sheet_name))
            .cloned()
            .with_context(|| format!("Sheet '{sheet_name}' not found"))
    }

    async fn clear_ranges(&mut self, ranges: &[&str]) -> Res<()> {
        let mut all = spreadsheets();
        let tabs = all.entry(self.spreadsheet_id.clone()).or_default();
        for range in ranges {
            let (tab, cells) = split_range(range);
            let Some(rows) = tabs.get_mut(tab) else {
                continue;
            };
            let (first, last) = column_span(cells)?;
            for row in rows.iter_mut() {
                for cell in row.iter_mut().skip(first).take(last + 1 - first) {
                    cell.clear();
                }
            }
            trim(rows);
        }
        Ok(())
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Res<()> {
        let mut all = spreadsheets();
        let tabs = all.entry(self.spreadsheet_id.clone()).or_default();
        for sr in data {
            let (tab, cells) = split_range(&sr.range);
            let (col, row) = parse_cell(cells)
                .with_context(|| format!("Unsupported write range '{}'", sr.range))?;
            let rows = tabs.entry(tab.to_string()).or_default();
            for (i, values) in sr.values.iter().enumerate() {
                let r = row + i;
                if rows.len() <= r {
                    rows.resize(r + 1, Vec::new());
                }
                let target = &mut rows[r];
                if target.len() < col + values.len() {
                    target.resize(col + values.len(), String::new());
                }
                for (j, value) in values.iter().enumerate() {
                    target[col + j] = value.clone();
                }
            }
            trim(rows);
        }
        Ok(())
    }
}

/// Zero-based column index of `A`, `B`, ..., `Z`, `AA`, ...
fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    let n = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1));
    Some(n - 1)
}

/// Parses a start cell like `A12` into zero-based `(column, row)`. A bare column like `A` starts at
/// the first row.
fn parse_cell(cell: &str) -> Option<(usize, usize)> {
    let split = cell
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);
    let col = column_index(letters)?;
    let row = if digits.is_empty() {
        0
    } else {
        digits.parse::<usize>().ok()?.checked_sub(1)?
    };
    Some((col, row))
}

/// Parses a column span like `A:B` into zero-based inclusive column indexes. An empty span covers
/// every column.
fn column_span(cells: &str) -> Res<(usize, usize)> {
    if cells.is_empty() {
        return Ok((0, usize::MAX - 1));
    }
    let Some((first, last)) = cells.split_once(':') else {
        bail!("Unsupported clear range '{cells}', expected columns such as A:B");
    };
    match (column_index(first), column_index(last)) {
        (Some(first), Some(last)) if first <= last => Ok((first, last)),
        _ => bail!("Unsupported clear range '{cells}', expected columns such as A:B"),
    }
}

/// Drops trailing empty cells and rows, which the Sheets API never returns.
fn trim(rows: &mut Vec<Vec<String>>) {
    for row in rows.iter_mut() {
        while row.last().is_some_and(String::is_empty) {
            row.pop();
        }
    }
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }
}

/// Provides the seed data from this module.
fn default_data() -> SheetData {
    let mut map = SheetData::new();
    map.insert(PRICE_SHEET.to_string(), load_csv(PRICE_DATA));
    map.insert(SALES_SHEET.to_string(), load_csv(SALES_DATA));
    map
}

/// Loads rows from a CSV-formatted string. The seed data is known to be well formed; a bad record
/// would end the rows early.
fn load_csv(csv_data: &str) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));
    rdr.records()
        .map_while(Result::ok)
        .map(|record| record.iter().map(str::to_string).collect())
        .collect()
}

/// Seed price data. `Pizza` is not on the menu and `Eggs` has no usable price.
const PRICE_DATA: &str = r##"Item,Price
Chapo,30
Ndazi,20
Tea,30
Soda,50
KukuPilau,420
BeefRice,250
Pizza,600
Eggs,abc
"##;

/// Seed sales data, one row per day. `Mandazi` is not on the menu, the fourth row is blank and the
/// fifth has no usable date.
const SALES_DATA: &str = r##"Date,Chapo,Ndazi,Tea,Soda,KukuPilau,Mandazi,Amount
2024-01-01,10,5,12,3,1,,1310
2024-01-02,8,,10,4,2,2,1540
,,,,,,,
not a date,1,,,,,,30
2024-01-03,6,2.5,x,0,1,,580
"##;

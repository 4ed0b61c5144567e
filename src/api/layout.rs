//! The shapes of the two spreadsheet tabs and conversion between them and the model.
//!
//! The price tab has a header row `[Item, Price]` followed by one row per item. The sales tab is
//! wide: a header row naming `Date`, one column per item and an `Amount` column, followed by one
//! row per day whose item cells hold the quantity sold that day.
//!
//! Reading either tab never fails on a bad cell. Cells that cannot be turned into data are listed
//! in an `IngestReport` and logged instead.

use crate::error::Res;
use crate::model::{Amount, PriceCatalog, SaleRecord};
use anyhow::bail;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

pub(crate) const ITEM: &str = "Item";
pub(crate) const PRICE: &str = "Price";
pub(crate) const DATE: &str = "Date";
pub(crate) const AMOUNT: &str = "Amount";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// What to do with a positive quantity for an item that has no price in the catalog.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownItemPolicy {
    /// Leave the cell out and report it.
    #[default]
    Skip,
    /// Record a sale with a zero price and no category, and report it.
    ZeroPrice,
}

serde_plain::derive_display_from_serialize!(UnknownItemPolicy);
serde_plain::derive_fromstr_from_deserialize!(UnknownItemPolicy);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The row has data but its date cell is empty.
    MissingDate,
    /// The date cell could not be parsed.
    BadDate,
    /// The quantity is not a non-negative whole number.
    BadQuantity,
    /// The price is not a non-negative number, or the total it gives is too large.
    BadPrice,
    /// The item is not in the catalog.
    UnknownItem,
    /// The item is not in the catalog and was recorded at a zero price.
    ZeroPriced,
}

serde_plain::derive_display_from_serialize!(SkipReason);

/// One cell (or whole row) that did not become data as-is.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Skipped {
    /// One-based row number as shown in the spreadsheet.
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub value: String,
    pub reason: SkipReason,
}

/// The outcome of reading a tab.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Number of cells turned into data.
    pub accepted: usize,
    pub skipped: Vec<Skipped>,
}

impl IngestReport {
    fn skip(&mut self, row: usize, column: Option<&str>, value: &str, reason: SkipReason) {
        warn!(
            "Row {row}{}: '{value}' {reason}",
            column.map(|c| format!(", column '{c}'")).unwrap_or_default()
        );
        self.skipped.push(Skipped {
            row,
            column: column.map(str::to_string),
            value: value.to_string(),
            reason,
        });
    }

    /// How many entries have the given reason.
    pub fn count(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// Reads the price tab. Each item is placed in the category that `current` lists it under; items
/// `current` does not know are reported rather than put in a made-up category.
pub(crate) fn parse_prices(
    rows: &[Vec<String>],
    current: &PriceCatalog,
) -> (PriceCatalog, IngestReport) {
    let mut catalog = PriceCatalog::new();
    let mut report = IngestReport::default();

    for (i, row) in rows.iter().enumerate().skip(1) {
        let sheet_row = i + 1;
        let item = cell(row, 0);
        if item.is_empty() {
            continue;
        }
        let raw_price = cell(row, 1);
        let price = match Amount::from_str(raw_price) {
            Ok(price) if !raw_price.is_empty() && !price.is_negative() => price,
            _ => {
                report.skip(sheet_row, Some(PRICE), raw_price, SkipReason::BadPrice);
                continue;
            }
        };
        match current.resolve(item) {
            Ok((category, _)) => {
                catalog.insert(category, item, price);
                report.accepted += 1;
            }
            Err(_) => {
                report.skip(sheet_row, Some(ITEM), item, SkipReason::UnknownItem);
            }
        }
    }
    (catalog, report)
}

/// Reads the sales tab into records priced from `catalog`.
///
/// Blank cells and zero quantities are not sales and are ignored silently, as are completely blank
/// rows. The `Amount` column is ignored because totals are always recomputed.
pub(crate) fn parse_sales(
    rows: &[Vec<String>],
    catalog: &PriceCatalog,
    policy: UnknownItemPolicy,
) -> Res<(Vec<SaleRecord>, IngestReport)> {
    let mut records = Vec::new();
    let mut report = IngestReport::default();

    let Some(header) = rows.first() else {
        return Ok((records, report));
    };
    let header: Vec<&str> = header.iter().map(|h| h.trim()).collect();
    let Some(date_col) = header.iter().position(|h| *h == DATE) else {
        bail!("The sales sheet header has no '{DATE}' column");
    };

    for (i, row) in rows.iter().enumerate().skip(1) {
        let sheet_row = i + 1;
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let raw_date = cell(row, date_col);
        if raw_date.is_empty() {
            report.skip(sheet_row, Some(DATE), raw_date, SkipReason::MissingDate);
            continue;
        }
        let Some(date) = parse_date(raw_date) else {
            report.skip(sheet_row, Some(DATE), raw_date, SkipReason::BadDate);
            continue;
        };

        for (col, item) in header.iter().enumerate() {
            if col == date_col || *item == AMOUNT || item.is_empty() {
                continue;
            }
            let raw = cell(row, col);
            let quantity = match parse_sheet_quantity(raw) {
                Some(0) => continue,
                Some(q) => q,
                None => {
                    report.skip(sheet_row, Some(*item), raw, SkipReason::BadQuantity);
                    continue;
                }
            };
            match (catalog.resolve(item), policy) {
                (Ok((_, price)), _) if price.checked_mul(quantity).is_none() => {
                    report.skip(sheet_row, Some(*item), raw, SkipReason::BadPrice);
                }
                (Ok((category, price)), _) => {
                    records.push(SaleRecord::new(date, *item, quantity, price, category, None));
                    report.accepted += 1;
                }
                (Err(_), UnknownItemPolicy::Skip) => {
                    report.skip(sheet_row, Some(*item), raw, SkipReason::UnknownItem);
                }
                (Err(_), UnknownItemPolicy::ZeroPrice) => {
                    records.push(SaleRecord::new(date, *item, quantity, Amount::ZERO, "", None));
                    report.accepted += 1;
                    report.skip(sheet_row, Some(*item), raw, SkipReason::ZeroPriced);
                }
            }
        }
    }
    Ok((records, report))
}

/// Builds the full contents of the price tab, header included.
pub(crate) fn price_rows(catalog: &PriceCatalog) -> Vec<Vec<String>> {
    std::iter::once(vec![ITEM.to_string(), PRICE.to_string()])
        .chain(
            catalog
                .entries()
                .map(|e| vec![e.item.to_string(), e.price.plain()]),
        )
        .collect()
}

/// Rows for the sales tab built from records, plus what could not be placed.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SalesUpload {
    /// One row per day, in ascending date order, following the header's column order.
    pub rows: Vec<Vec<String>>,
    /// Days left out because the tab already has a row for them.
    pub existing_days: Vec<NaiveDate>,
    /// Items that have no column in the header. Their totals still count toward `Amount`.
    pub unmatched_items: Vec<String>,
}

/// Builds one row per day for the records whose day is not already in `existing`.
///
/// `existing` is the current content of the tab, header first. Each new row follows the header:
/// the `Date` column gets the day, each item column gets the quantity sold (0 if none) and the
/// `Amount` column gets the sum of that day's record totals.
pub(crate) fn sales_rows<'a>(
    existing: &[Vec<String>],
    records: impl IntoIterator<Item = &'a SaleRecord>,
) -> Res<SalesUpload> {
    let Some(header) = existing.first() else {
        bail!("The sales sheet has no header row");
    };
    let header: Vec<&str> = header.iter().map(|h| h.trim()).collect();
    let Some(date_col) = header.iter().position(|h| *h == DATE) else {
        bail!("The sales sheet header has no '{DATE}' column");
    };
    let present: Vec<NaiveDate> = existing
        .iter()
        .skip(1)
        .filter_map(|row| parse_date(cell(row, date_col)))
        .collect();

    let mut days: BTreeMap<NaiveDate, (BTreeMap<&str, u64>, Amount)> = BTreeMap::new();
    let mut upload = SalesUpload::default();
    for r in records {
        if present.contains(&r.date()) {
            if !upload.existing_days.contains(&r.date()) {
                upload.existing_days.push(r.date());
            }
            continue;
        }
        if !header.contains(&r.item()) && !upload.unmatched_items.iter().any(|i| i == r.item()) {
            upload.unmatched_items.push(r.item().to_string());
        }
        let (quantities, amount) = days.entry(r.date()).or_default();
        *quantities.entry(r.item()).or_default() += u64::from(r.quantity());
        *amount += r.total();
    }
    upload.existing_days.sort();

    for (date, (quantities, amount)) in days {
        let row = header
            .iter()
            .enumerate()
            .map(|(col, name)| {
                if col == date_col {
                    date.format("%Y-%m-%d").to_string()
                } else if *name == AMOUNT {
                    amount.plain()
                } else if name.is_empty() {
                    String::new()
                } else {
                    quantities.get(name).copied().unwrap_or(0).to_string()
                }
            })
            .collect();
        upload.rows.push(row);
    }
    Ok(upload)
}

/// Trimmed cell content, empty when the row is shorter than `col`.
fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(|c| c.trim()).unwrap_or_default()
}

/// Parses a date cell, ignoring any time of day.
fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a quantity cell. Empty means zero. Whole numbers written with a decimal point, e.g.
/// `3.0`, are accepted; fractions and negatives are not.
fn parse_sheet_quantity(s: &str) -> Option<u32> {
    if s.is_empty() {
        return Some(0);
    }
    if let Ok(q) = s.parse::<u32>() {
        return Some(q);
    }
    let d = Decimal::from_str(s).ok()?;
    if d.is_sign_negative() || d.fract() != Decimal::ZERO {
        return None;
    }
    d.to_u32()
}

//! CSV export of sale records.

use crate::error::Res;
use crate::model::SaleRecord;
use anyhow::Context;
use std::io::Write;

const HEADER: [&str; 7] = ["Date", "Item", "Quantity", "Price", "Total", "Category", "Notes"];

/// Writes `records` as CSV with a header row. Amounts are written without currency or separators.
pub fn to_csv<'a, W: Write>(
    writer: W,
    records: impl IntoIterator<Item = &'a SaleRecord>,
) -> Res<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)
        .context("Unable to write the CSV header")?;
    let mut count = 0;
    for r in records {
        wtr.write_record([
            r.date().format("%Y-%m-%d").to_string(),
            r.item().to_string(),
            r.quantity().to_string(),
            r.unit_price().plain(),
            r.total().plain(),
            r.category().to_string(),
            r.note().unwrap_or_default().to_string(),
        ])
        .with_context(|| format!("Unable to write CSV row for {} on {}", r.item(), r.date()))?;
        count += 1;
    }
    wtr.flush().context("Unable to flush CSV output")?;
    Ok(count)
}

/// Renders `records` as a CSV string.
pub fn to_csv_string<'a>(records: impl IntoIterator<Item = &'a SaleRecord>) -> Res<String> {
    let mut buf = Vec::new();
    to_csv(&mut buf, records)?;
    String::from_utf8(buf).context("CSV output was not UTF-8")
}

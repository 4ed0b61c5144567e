//! Aggregation of sale records into totals, per-category breakdowns, top-N item rankings and a
//! daily trend.
//!
//! Every function here is total: an empty input produces zeroed totals and empty collections, and
//! nothing in this module returns an error. The functions accept any iterator over `&SaleRecord`
//! so they work the same whether the records came from `records.json` or from the spreadsheet.

use crate::model::{Amount, SaleRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// The number of items ranked per category when the caller does not choose.
pub const DEFAULT_TOP_N: usize = 3;

/// An inclusive range of days. A range whose `start` is after its `end` contains nothing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The smallest range holding every record, or `None` when there are no records.
    pub fn covering<'a>(records: impl IntoIterator<Item = &'a SaleRecord>) -> Option<Self> {
        records.into_iter().fold(None, |range, r| {
            let d = r.date();
            Some(match range {
                None => DateRange::new(d, d),
                Some(DateRange { start, end }) => DateRange::new(start.min(d), end.max(d)),
            })
        })
    }

    /// Fills in whichever bound is missing from `covering`. Returns `None` only when both bounds
    /// are missing and there are no records.
    pub fn from_bounds<'a>(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        records: impl IntoIterator<Item = &'a SaleRecord>,
    ) -> Option<Self> {
        match (start, end) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            (start, end) => {
                let covering = DateRange::covering(records)?;
                Some(DateRange::new(
                    start.unwrap_or(covering.start),
                    end.unwrap_or(covering.end),
                ))
            }
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Returns the records dated within `range`, keeping their order.
pub fn filter_by_date<'a>(
    records: impl IntoIterator<Item = &'a SaleRecord>,
    range: &DateRange,
) -> Vec<&'a SaleRecord> {
    records
        .into_iter()
        .filter(|r| range.contains(r.date()))
        .collect()
}

/// Headline numbers over a set of records.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_sales: Amount,
    pub total_items: u64,
    pub order_count: usize,
    /// Mean `total` per record, zero when there are no records.
    pub average_order: Amount,
}

pub fn totals<'a>(records: impl IntoIterator<Item = &'a SaleRecord>) -> Totals {
    let mut t = Totals::default();
    for r in records {
        t.total_sales += r.total();
        t.total_items += u64::from(r.quantity());
        t.order_count += 1;
    }
    t.average_order = t.total_sales.mean_over(t.order_count);
    t
}

/// Sales per category. Only categories that appear in `records` are present.
pub fn category_breakdown<'a>(
    records: impl IntoIterator<Item = &'a SaleRecord>,
) -> BTreeMap<String, Amount> {
    let mut breakdown: BTreeMap<String, Amount> = BTreeMap::new();
    for r in records {
        *breakdown.entry(r.category().to_string()).or_default() += r.total();
    }
    breakdown
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ItemQuantity {
    pub item: String,
    pub quantity: u64,
}

/// The best-selling items of one category, highest quantity first.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryRanking {
    pub category: String,
    pub items: Vec<ItemQuantity>,
}

/// Ranks the items of each category by summed quantity and keeps the first `n`.
///
/// Categories are listed in the order they are first seen in `records`. Items with equal
/// quantities keep the order in which they were first seen, so `[A:5, B:5, C:3, D:5]` with `n = 3`
/// gives `[A, B, D]`.
pub fn top_items<'a>(
    records: impl IntoIterator<Item = &'a SaleRecord>,
    n: usize,
) -> Vec<CategoryRanking> {
    // Both levels are kept in first-seen order.
    let mut rankings: Vec<CategoryRanking> = Vec::new();
    for r in records {
        let ranking = match rankings.iter().position(|c| c.category == r.category()) {
            Some(i) => &mut rankings[i],
            None => {
                rankings.push(CategoryRanking {
                    category: r.category().to_string(),
                    items: Vec::new(),
                });
                let last = rankings.len() - 1;
                &mut rankings[last]
            }
        };
        match ranking.items.iter_mut().find(|i| i.item == r.item()) {
            Some(item) => item.quantity += u64::from(r.quantity()),
            None => ranking.items.push(ItemQuantity {
                item: r.item().to_string(),
                quantity: u64::from(r.quantity()),
            }),
        }
    }

    for ranking in &mut rankings {
        // Stable: equal quantities stay in first-seen order.
        ranking.items.sort_by_key(|i| Reverse(i.quantity));
        ranking.items.truncate(n);
    }
    rankings
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Amount,
}

/// Sales per day in ascending date order. Days without sales are left out.
pub fn daily_trend<'a>(records: impl IntoIterator<Item = &'a SaleRecord>) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, Amount> = BTreeMap::new();
    for r in records {
        *days.entry(r.date()).or_default() += r.total();
    }
    days.into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}

/// Everything the `report` command shows, computed over one date range.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    pub top_n: usize,
    pub totals: Totals,
    pub categories: BTreeMap<String, Amount>,
    pub top_items: Vec<CategoryRanking>,
    pub daily: Vec<DailyTotal>,
}

impl Report {
    /// Builds a report over the records within `range`, or over all records when `range` is
    /// `None`.
    pub fn build(records: &[SaleRecord], range: Option<DateRange>, top_n: usize) -> Self {
        let selected = match &range {
            Some(range) => filter_by_date(records, range),
            None => records.iter().collect(),
        };
        Self {
            range,
            top_n,
            totals: totals(selected.iter().copied()),
            categories: category_breakdown(selected.iter().copied()),
            top_items: top_items(selected.iter().copied(), top_n),
            daily: daily_trend(selected.iter().copied()),
        }
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.range {
            Some(range) => writeln!(f, "Sales report for {range}")?,
            None => writeln!(f, "Sales report")?,
        }
        writeln!(f, "  Total sales:   {}", self.totals.total_sales)?;
        writeln!(f, "  Total items:   {}", self.totals.total_items)?;
        writeln!(f, "  Average order: {}", self.totals.average_order)?;
        writeln!(f, "  Total orders:  {}", self.totals.order_count)?;

        if self.totals.order_count == 0 {
            return write!(f, "No sales in this period");
        }

        writeln!(f, "Sales by category")?;
        for (category, total) in &self.categories {
            writeln!(f, "  {category}: {total}")?;
        }

        writeln!(f, "Top {} items per category", self.top_n)?;
        for ranking in &self.top_items {
            writeln!(f, "  {}", ranking.category)?;
            for (i, item) in ranking.items.iter().enumerate() {
                writeln!(f, "    {}. {} ({})", i + 1, item.item, item.quantity)?;
            }
        }

        write!(f, "Daily sales")?;
        for day in &self.daily {
            write!(f, "\n  {}: {}", day.date, day.total)?;
        }
        Ok(())
    }
}

use crate::model::{Amount, SaleRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The ordered list of accepted sales. Records are only ever appended, and only removed all at once
/// by `clear`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordStore {
    records: Vec<SaleRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: SaleRecord) {
        self.records.push(record);
    }

    pub(crate) fn extend(&mut self, records: impl IntoIterator<Item = SaleRecord>) {
        self.records.extend(records);
    }

    /// Removes every record, returning how many there were.
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        count
    }

    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SaleRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records matching every criterion set on `filter`, in insertion order.
    pub fn filter<'a>(&'a self, filter: &'a RecordFilter) -> impl Iterator<Item = &'a SaleRecord> {
        self.records.iter().filter(move |r| filter.matches(r))
    }
}

impl From<Vec<SaleRecord>> for RecordStore {
    fn from(records: Vec<SaleRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a SaleRecord;
    type IntoIter = std::slice::Iter<'a, SaleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Narrows the records shown by `sales list`. Unset fields match everything.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &SaleRecord) -> bool {
        self.date.is_none_or(|d| record.date() == d)
            && self.category.as_deref().is_none_or(|c| record.category() == c)
            && self.item.as_deref().is_none_or(|i| record.item() == i)
    }
}

/// Validated records waiting to be committed to the `RecordStore` in one go.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BulkEntries {
    entries: Vec<SaleRecord>,
}

/// What a commit of the staged entries would add.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct BulkSummary {
    pub entries: usize,
    pub total_sales: Amount,
    pub total_items: u64,
}

impl BulkEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: SaleRecord) {
        self.entries.push(record);
    }

    pub fn entries(&self) -> &[SaleRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> BulkSummary {
        BulkSummary {
            entries: self.entries.len(),
            total_sales: self.entries.iter().map(SaleRecord::total).sum(),
            total_items: self.entries.iter().map(|r| u64::from(r.quantity())).sum(),
        }
    }

    /// Empties the stage and hands back what was in it.
    pub(crate) fn take(&mut self) -> Vec<SaleRecord> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, category: &str, item: &str, quantity: u32, price: u32) -> SaleRecord {
        SaleRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            item,
            quantity,
            Amount::from(price),
            category,
            None,
        )
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut store = RecordStore::new();
        store.push(record(2, "Snacks", "Chapo", 1, 30));
        store.push(record(1, "Drinks", "Soda", 1, 50));
        let items: Vec<&str> = store.iter().map(SaleRecord::item).collect();
        assert_eq!(items, vec!["Chapo", "Soda"]);
    }

    #[test]
    fn test_clear_returns_count() {
        let mut store = RecordStore::from(vec![record(1, "Snacks", "Chapo", 1, 30)]);
        assert_eq!(store.clear(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_filter_combines_criteria() {
        let store = RecordStore::from(vec![
            record(1, "Snacks", "Chapo", 1, 30),
            record(1, "Snacks", "Ndazi", 2, 20),
            record(2, "Snacks", "Chapo", 3, 30),
            record(1, "Drinks", "Soda", 1, 50),
        ]);

        let all = RecordFilter::default();
        assert_eq!(store.filter(&all).count(), 4);

        let day_one_snacks = RecordFilter {
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            category: Some("Snacks".to_string()),
            item: None,
        };
        assert_eq!(store.filter(&day_one_snacks).count(), 2);

        let chapo = RecordFilter {
            item: Some("Chapo".to_string()),
            ..RecordFilter::default()
        };
        let quantities: Vec<u32> = store.filter(&chapo).map(SaleRecord::quantity).collect();
        assert_eq!(quantities, vec![1, 3]);
    }

    #[test]
    fn test_bulk_summary() {
        let mut bulk = BulkEntries::new();
        assert_eq!(bulk.summary(), BulkSummary::default());
        bulk.push(record(1, "Snacks", "Chapo", 2, 30));
        bulk.push(record(1, "Drinks", "Soda", 3, 50));
        let summary = bulk.summary();
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.total_sales, Amount::from(210));
        assert_eq!(summary.total_items, 5);
    }

    #[test]
    fn test_take_empties_stage() {
        let mut bulk = BulkEntries::new();
        bulk.push(record(1, "Snacks", "Chapo", 2, 30));
        let taken = bulk.take();
        assert_eq!(taken.len(), 1);
        assert!(bulk.is_empty());
    }

    #[test]
    fn test_json_round_trip_is_identical() {
        let store = RecordStore::from(vec![
            record(1, "Snacks", "Chapo", 2, 30),
            record(2, "Drinks", "Soda", 1, 50),
        ]);
        let json = serde_json::to_string_pretty(&store).unwrap();
        let loaded: RecordStore = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(serde_json::to_string_pretty(&loaded).unwrap(), json);
    }
}

//! Types that represent the core data model: the price catalog, sale records and the record store.
mod amount;
mod catalog;
mod sale;
mod store;

pub use amount::{Amount, AmountError};
pub use catalog::{CatalogEntry, PriceCatalog};
pub use sale::{parse_quantity, NewSale, SaleRecord, ValidationError};
pub use store::{BulkEntries, BulkSummary, RecordFilter, RecordStore};

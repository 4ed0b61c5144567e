//! pos-sales: record food-stall sales against a price list, keep them in local JSON files, sync
//! them with a Google sheet and report on them.

mod api;
pub mod args;
pub mod auth;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod export;
mod files;
pub mod model;
pub mod report;
pub mod state;
mod utils;

#[cfg(test)]
mod test;

pub use api::layout::{IngestReport, SalesUpload, SkipReason, Skipped, UnknownItemPolicy};
pub use api::Mode;
pub use config::Config;
pub use error::{Error, ErrorType, Result};

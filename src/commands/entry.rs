//! Bulk entry: stage several sales, look them over, then record them with one save.

use crate::args::{EntryAddArgs, EntrySpec};
use crate::commands::{plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{parse_quantity, BulkSummary, NewSale, PriceCatalog, SaleRecord, ValidationError};
use crate::state::AppState;
use crate::{Config, Result};
use anyhow::Context;
use chrono::NaiveDate;
use std::fmt::Write;
use tracing::debug;

/// Validates every entry in `args` and adds them to the stage. If any entry is invalid nothing is
/// staged.
pub async fn entry_add(config: Config, args: EntryAddArgs) -> Result<Out<BulkSummary>> {
    let mut state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    for spec in args.entries() {
        let sale = new_sale(spec, args.date(), args.note(), state.catalog())
            .pub_result(ErrorType::Validation)?;
        let record = state.stage(sale).pub_result(ErrorType::Validation)?;
        debug!("Staged {} x{} for {}", record.item(), record.quantity(), record.total());
    }
    state
        .save_staged()
        .await
        .pub_result(ErrorType::Persistence)?;

    let summary = state.staged().summary();
    Ok(Out::new(
        format!(
            "Staged {}, {} staged in total worth {}",
            plural(args.entries().len(), "entry"),
            summary.entries,
            summary.total_sales
        ),
        summary,
    ))
}

/// Shows the staged entries and their summary.
pub async fn entry_list(config: Config) -> Result<Out<Vec<SaleRecord>>> {
    let state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    let staged = state.staged();
    let summary = staged.summary();
    let mut message = String::new();
    for record in staged.entries() {
        let _ = writeln!(message, "{}", super::sales::line(record));
    }
    let _ = write!(
        message,
        "{} staged, quantity {}, worth {}",
        plural(summary.entries, "entry"),
        summary.total_items,
        summary.total_sales
    );
    Ok(Out::new(message, staged.entries().to_vec()))
}

/// Moves the staged entries into the record store.
///
/// The records are saved before the stage is emptied on disk. If saving the records fails the
/// stage is left as it was so the commit can be retried.
pub async fn entry_commit(config: Config) -> Result<Out<BulkSummary>> {
    let mut state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    if state.staged().is_empty() {
        return Ok(Out::new("Nothing to commit", BulkSummary::default()));
    }
    let summary = state.commit_staged();
    state
        .save_records()
        .await
        .pub_result(ErrorType::Persistence)?;
    state
        .save_staged()
        .await
        .context(
            "The staged entries were recorded but could not be removed from the stage. Run \
             'pos entry discard' before committing again or they will be recorded twice",
        )
        .pub_result(ErrorType::Persistence)?;
    Ok(Out::new(
        format!(
            "Recorded {}, quantity {}, worth {}",
            plural(summary.entries, "entry"),
            summary.total_items,
            summary.total_sales
        ),
        summary,
    ))
}

/// Empties the stage without recording anything.
pub async fn entry_discard(config: Config) -> Result<Out<usize>> {
    let mut state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    let discarded = state.discard_staged();
    state
        .save_staged()
        .await
        .pub_result(ErrorType::Persistence)?;
    Ok(Out::new(
        format!("Discarded {}", plural(discarded, "staged entry")),
        discarded,
    ))
}

/// Turns a command line entry into an unvalidated sale. A missing category is found by item name
/// and a missing price comes from the catalog.
pub(super) fn new_sale(
    spec: &EntrySpec,
    date: NaiveDate,
    note: Option<&str>,
    catalog: &PriceCatalog,
) -> std::result::Result<NewSale, ValidationError> {
    let quantity = parse_quantity(spec.quantity())?;
    if spec.item().is_empty() {
        return Err(ValidationError::MissingItem {
            category: spec.category().unwrap_or_default().to_string(),
            item: String::new(),
        });
    }
    let (category, catalog_price) = match spec.category() {
        Some(category) => (category, catalog.lookup(category, spec.item())?),
        None => catalog.resolve(spec.item())?,
    };
    Ok(NewSale {
        date,
        category: category.to_string(),
        item: spec.item().to_string(),
        quantity,
        unit_price: spec.price().unwrap_or(catalog_price),
        note: note.map(str::to_string),
    })
}

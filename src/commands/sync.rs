//! Syncing the price and sales tabs of the spreadsheet with the local files.

use crate::api::layout::{self, IngestReport, SalesUpload, UnknownItemPolicy};
use crate::api::{a1, Mode, Sheet, SheetRange};
use crate::args::SyncTarget;
use crate::backup::{CATALOG, RECORDS, SALES_SHEET};
use crate::commands::{plural, Out};
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::RecordStore;
use crate::state::AppState;
use crate::{Config, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// The outcome of `sync down`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SyncDown {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<IngestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales: Option<IngestReport>,
}

/// The outcome of `sync up`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SyncUp {
    /// Number of items written to the price tab.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales: Option<SalesUpload>,
}

/// Downloads the price tab, the sales tab or both, replacing the local catalog and records.
///
/// Prices are downloaded first so that sales are priced from the new price list. Each local file
/// is backed up before it is replaced. Cells that cannot be used are listed in the returned
/// reports and logged; how unpriced items are treated is decided by `policy`.
///
/// # Errors
///
/// - `ErrorType::Config` if no sheet URL is configured.
/// - `ErrorType::Sheet` if the sheet client cannot be created.
/// - `ErrorType::Persistence` if reading the sheet or writing local files fails.
pub async fn sync_down(
    config: Config,
    mode: Mode,
    target: SyncTarget,
    policy: UnknownItemPolicy,
) -> Result<Out<SyncDown>> {
    config
        .require_spreadsheet_id()
        .pub_result(ErrorType::Config)?;
    let mut sheet = crate::api::sheet(&config, mode)
        .await
        .pub_result(ErrorType::Sheet)?;
    let mut state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    let mut out = SyncDown::default();
    let mut messages = Vec::new();

    if target.prices() {
        let report = download_prices(&config, sheet.as_mut(), &mut state)
            .await
            .pub_result(ErrorType::Persistence)?;
        messages.push(format!(
            "Downloaded {}, skipped {}",
            plural(report.accepted, "price"),
            report.skipped.len()
        ));
        out.prices = Some(report);
    }

    if target.sales() {
        let report = download_sales(&config, sheet.as_mut(), &mut state, policy)
            .await
            .pub_result(ErrorType::Persistence)?;
        messages.push(format!(
            "Downloaded {}, skipped {}",
            plural(report.accepted, "sale"),
            report.skipped.len()
        ));
        out.sales = Some(report);
    }

    Ok(Out::new(messages.join("\n"), out))
}

/// Uploads the catalog to the price tab, the records to the sales tab, or both.
///
/// The price tab is cleared and rewritten. The sales tab is only appended to: days that already
/// have a row are left alone and listed in the result, and a copy of the tab is backed up first.
pub async fn sync_up(config: Config, mode: Mode, target: SyncTarget) -> Result<Out<SyncUp>> {
    config
        .require_spreadsheet_id()
        .pub_result(ErrorType::Config)?;
    let mut sheet = crate::api::sheet(&config, mode)
        .await
        .pub_result(ErrorType::Sheet)?;
    let state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    let mut out = SyncUp::default();
    let mut messages = Vec::new();

    if target.prices() {
        let written = upload_prices(&config, sheet.as_mut(), &state)
            .await
            .pub_result(ErrorType::Persistence)?;
        messages.push(format!("Uploaded {}", plural(written, "price")));
        out.prices = Some(written);
    }

    if target.sales() {
        let upload = upload_sales(&config, sheet.as_mut(), &state)
            .await
            .pub_result(ErrorType::Persistence)?;
        messages.push(format!(
            "Uploaded {} of sales, skipped {} already in the sheet",
            plural(upload.rows.len(), "row"),
            plural(upload.existing_days.len(), "day")
        ));
        out.sales = Some(upload);
    }

    Ok(Out::new(messages.join("\n"), out))
}

async fn download_prices(
    config: &Config,
    sheet: &mut (dyn Sheet + Send),
    state: &mut AppState,
) -> Res<IngestReport> {
    let rows = sheet.get(config.price_sheet()).await?;
    let (catalog, report) = layout::parse_prices(&rows, state.catalog());
    if catalog.is_empty() {
        warn!(
            "No usable prices in the '{}' tab, keeping the current catalog",
            config.price_sheet()
        );
        return Ok(report);
    }

    let backup = config.backup().save_json(CATALOG, state.catalog()).await?;
    debug!("Saved a backup of the catalog to {}", backup.display());
    let _ = state.replace_catalog(catalog);
    state.save_catalog().await?;
    info!(
        "Replaced the catalog with {} from '{}'",
        plural(report.accepted, "price"),
        config.price_sheet()
    );
    Ok(report)
}

async fn download_sales(
    config: &Config,
    sheet: &mut (dyn Sheet + Send),
    state: &mut AppState,
    policy: UnknownItemPolicy,
) -> Res<IngestReport> {
    let rows = sheet.get(config.sales_sheet()).await?;
    let (records, report) = layout::parse_sales(&rows, state.catalog(), policy)
        .with_context(|| format!("Unable to read the '{}' tab", config.sales_sheet()))?;

    let backup = config.backup().save_json(RECORDS, state.records()).await?;
    debug!("Saved a backup of the records to {}", backup.display());
    let _ = state.replace_records(RecordStore::from(records));
    state.save_records().await?;
    info!(
        "Replaced the records with {} from '{}'",
        plural(report.accepted, "sale"),
        config.sales_sheet()
    );
    Ok(report)
}

async fn upload_prices(
    config: &Config,
    sheet: &mut (dyn Sheet + Send),
    state: &AppState,
) -> Res<usize> {
    let tab = config.price_sheet();
    let rows = layout::price_rows(state.catalog());
    let written = rows.len() - 1;
    let clear = a1(tab, "A:B");
    sheet.clear_ranges(&[clear.as_str()]).await?;
    sheet
        .write_ranges(&[SheetRange {
            range: a1(tab, "A1"),
            values: rows,
        }])
        .await?;
    Ok(written)
}

async fn upload_sales(
    config: &Config,
    sheet: &mut (dyn Sheet + Send),
    state: &AppState,
) -> Res<SalesUpload> {
    let tab = config.sales_sheet();
    let existing = sheet.get(tab).await?;
    let upload = layout::sales_rows(&existing, state.records())
        .with_context(|| format!("Unable to build rows for the '{tab}' tab"))?;
    for item in &upload.unmatched_items {
        warn!("The '{tab}' tab has no column for {item}, its sales only count toward the amount");
    }
    if upload.rows.is_empty() {
        return Ok(upload);
    }

    let backup = config.backup().save_json(SALES_SHEET, &existing).await?;
    debug!("Saved a copy of the '{tab}' tab to {}", backup.display());
    let start = format!("A{}", existing.len() + 1);
    sheet
        .write_ranges(&[SheetRange {
            range: a1(tab, &start),
            values: upload.rows.clone(),
        }])
        .await?;
    Ok(upload)
}

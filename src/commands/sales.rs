//! Recording, listing, exporting and clearing sales.

use crate::args::{ExportArgs, SalesAddArgs, SalesListArgs};
use crate::backup::RECORDS;
use crate::commands::entry::new_sale;
use crate::commands::{plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::export;
use crate::model::SaleRecord;
use crate::report::{filter_by_date, DateRange};
use crate::state::AppState;
use crate::{utils, Config, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::PathBuf;
use tracing::info;

/// The outcome of `sales export`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Export {
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    /// Where the CSV was written. `None` means it is in `csv` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip)]
    pub csv: Option<String>,
}

/// The outcome of `sales clear`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Cleared {
    pub removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

/// Validates a single sale and appends it to the record store.
pub async fn sales_add(config: Config, args: SalesAddArgs) -> Result<Out<SaleRecord>> {
    let mut state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    let sale = new_sale(args.entry(), args.date(), args.note(), state.catalog())
        .pub_result(ErrorType::Validation)?;
    let record = state
        .record(sale)
        .pub_result(ErrorType::Validation)?
        .clone();
    state
        .save_records()
        .await
        .pub_result(ErrorType::Persistence)?;
    Ok(Out::new(format!("Recorded {}", line(&record)), record))
}

/// Lists the recorded sales that match the filter in `args`, in the order they were recorded.
pub async fn sales_list(config: Config, args: SalesListArgs) -> Result<Out<Vec<SaleRecord>>> {
    let state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    let filter = args.filter();
    let records: Vec<SaleRecord> = state.records().filter(&filter).cloned().collect();

    let mut message = String::new();
    for record in &records {
        let _ = writeln!(message, "{}", line(record));
    }
    let totals = crate::report::totals(&records);
    let _ = write!(
        message,
        "{} of {}, quantity {}, worth {}",
        plural(records.len(), "sale"),
        state.records().len(),
        totals.total_items,
        totals.total_sales
    );
    Ok(Out::new(message, records))
}

/// Renders the sales that match the filter and range in `args` as CSV, to the output file if one
/// is given. Missing range bounds are taken from the matching sales.
pub async fn sales_export(config: Config, args: ExportArgs) -> Result<Out<Export>> {
    let state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    let filter = args.filter();
    let matching: Vec<&SaleRecord> = state.records().filter(&filter).collect();
    let range = DateRange::from_bounds(
        args.range().from(),
        args.range().to(),
        matching.iter().copied(),
    );
    let selected = match &range {
        Some(range) => filter_by_date(matching.iter().copied(), range),
        None => matching,
    };
    let csv = export::to_csv_string(selected.iter().copied()).pub_result(ErrorType::Persistence)?;

    let mut export = Export {
        rows: selected.len(),
        range,
        path: None,
        csv: None,
    };
    let message = match args.output() {
        Some(path) => {
            utils::write(path, &csv)
                .await
                .pub_result(ErrorType::Persistence)?;
            export.path = Some(path.to_path_buf());
            format!("Exported {} to {}", plural(export.rows, "sale"), path.display())
        }
        None => {
            export.csv = Some(csv);
            format!("Exported {}", plural(export.rows, "sale"))
        }
    };
    Ok(Out::new(message, export))
}

/// Deletes every record after writing them to a backup.
pub async fn sales_clear(config: Config) -> Result<Out<Cleared>> {
    let mut state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    if state.records().is_empty() {
        return Ok(Out::new(
            "There are no sales to clear",
            Cleared {
                removed: 0,
                backup: None,
            },
        ));
    }
    let backup = config
        .backup()
        .save_json(RECORDS, state.records())
        .await
        .pub_result(ErrorType::Persistence)?;
    info!("Saved a backup of the records to {}", backup.display());

    let removed = state.clear_records();
    state
        .save_records()
        .await
        .pub_result(ErrorType::Persistence)?;
    Ok(Out::new(
        format!("Cleared {}", plural(removed, "sale")),
        Cleared {
            removed,
            backup: Some(backup),
        },
    ))
}

/// One record as a line of text.
pub(super) fn line(r: &SaleRecord) -> String {
    let mut s = format!(
        "{}  {} x{} @ {} = {}",
        r.date(),
        r.item(),
        r.quantity(),
        r.unit_price(),
        r.total()
    );
    if !r.category().is_empty() {
        let _ = write!(s, " ({})", r.category());
    }
    if let Some(note) = r.note() {
        let _ = write!(s, " [{note}]");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{EntrySpec, RangeArgs};
    use crate::model::{Amount, ValidationError};
    use crate::test::{date, TestEnv};
    use std::str::FromStr;

    async fn add(env: &TestEnv, day: &str, entry: &str) -> SaleRecord {
        let args = SalesAddArgs::new(Some(date(day)), EntrySpec::from_str(entry).unwrap(), None);
        sales_add(env.config(), args)
            .await
            .unwrap()
            .structure()
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_sales_add() {
        let env = TestEnv::new().await;
        let record = add(&env, "2024-01-01", "Chapo=3").await;
        assert_eq!(record.total(), Amount::from(90));
        assert_eq!(record.category(), "Snacks");
        assert_eq!(env.state().await.records().len(), 1);

        let args = SalesAddArgs::new(None, EntrySpec::from_str("Pizza=1").unwrap(), None);
        let err = sales_add(env.config(), args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert!(matches!(
            err.find::<ValidationError>(),
            Some(ValidationError::ItemNotFound { .. })
        ));
        assert_eq!(env.state().await.records().len(), 1);
    }

    #[tokio::test]
    async fn test_sales_list_filters() {
        let env = TestEnv::new().await;
        add(&env, "2024-01-01", "Chapo=3").await;
        add(&env, "2024-01-01", "Soda=1").await;
        add(&env, "2024-01-02", "Chapo=1").await;

        let args = SalesListArgs::new(None, None, Some("Chapo".to_string()));
        let out = sales_list(env.config(), args).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 2);
        assert!(out.message().ends_with("2 sales of 3, quantity 4, worth KSh 120.00"));

        let args = SalesListArgs::new(Some(date("2024-01-01")), Some("Drinks".to_string()), None);
        let out = sales_list(env.config(), args).await.unwrap();
        assert_eq!(
            out.message(),
            "2024-01-01  Soda x1 @ KSh 50.00 = KSh 50.00 (Drinks)\n1 sale of 3, quantity 1, worth KSh 50.00"
        );
    }

    #[tokio::test]
    async fn test_sales_export_to_file_and_stdout() {
        let env = TestEnv::new().await;
        add(&env, "2024-01-01", "Chapo=3").await;
        add(&env, "2024-01-03", "Soda=1").await;

        let args = ExportArgs::new(RangeArgs::new(Some(date("2024-01-02")), None), None, None, None);
        let out = sales_export(env.config(), args).await.unwrap();
        let export = out.structure().unwrap();
        assert_eq!(export.rows, 1);
        assert_eq!(
            export.csv.as_deref(),
            Some("Date,Item,Quantity,Price,Total,Category,Notes\n2024-01-03,Soda,1,50,50,Drinks,\n")
        );

        let path = env.config().root().join("sales.csv");
        let args = ExportArgs::new(RangeArgs::default(), None, None, Some(path.clone()));
        let out = sales_export(env.config(), args).await.unwrap();
        assert_eq!(out.structure().unwrap().rows, 2);
        let written = utils::read(&path).await.unwrap();
        assert_eq!(written.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_sales_export_by_category() {
        let env = TestEnv::new().await;
        add(&env, "2024-01-01", "Chapo=3").await;
        add(&env, "2024-01-02", "Soda=2").await;
        add(&env, "2024-01-03", "Chapo=1").await;
        add(&env, "2024-01-04", "Soda=1").await;

        let args = ExportArgs::new(RangeArgs::default(), Some("Drinks".to_string()), None, None);
        let out = sales_export(env.config(), args).await.unwrap();
        let export = out.structure().unwrap();
        assert_eq!(export.rows, 2);
        assert_eq!(
            export.range,
            Some(DateRange::new(date("2024-01-02"), date("2024-01-04")))
        );
        assert_eq!(
            export.csv.as_deref(),
            Some("Date,Item,Quantity,Price,Total,Category,Notes\n2024-01-02,Soda,2,50,100,Drinks,\n2024-01-04,Soda,1,50,50,Drinks,\n")
        );

        let args = ExportArgs::new(
            RangeArgs::new(None, Some(date("2024-01-02"))),
            None,
            Some("Chapo".to_string()),
            None,
        );
        let out = sales_export(env.config(), args).await.unwrap();
        assert_eq!(out.structure().unwrap().rows, 1);

        let args = ExportArgs::new(RangeArgs::default(), Some("Pastries".to_string()), None, None);
        let out = sales_export(env.config(), args).await.unwrap();
        assert_eq!(out.structure().unwrap().rows, 0);
    }

    #[tokio::test]
    async fn test_sales_clear_writes_backup() {
        let env = TestEnv::new().await;
        let out = sales_clear(env.config()).await.unwrap();
        assert_eq!(out.structure().unwrap().removed, 0);

        add(&env, "2024-01-01", "Chapo=3").await;
        add(&env, "2024-01-02", "Tea=2").await;
        let out = sales_clear(env.config()).await.unwrap();
        let cleared = out.structure().unwrap();
        assert_eq!(cleared.removed, 2);
        assert!(env.state().await.records().is_empty());

        let backup = cleared.backup.as_ref().unwrap();
        let saved: Vec<SaleRecord> = utils::deserialize(backup).await.unwrap();
        assert_eq!(saved.len(), 2);
    }
}

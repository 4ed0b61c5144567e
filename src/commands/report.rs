use crate::args::ReportArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::report::{DateRange, Report};
use crate::state::AppState;
use crate::{Config, Result};

/// Summarizes the recorded sales: totals, sales by category, top items per category and sales per
/// day.
///
/// A missing `--from` or `--to` is taken from the earliest or latest sale. A range whose start is
/// after its end is not an error; the report is simply empty.
pub async fn report(config: Config, args: ReportArgs) -> Result<Out<Report>> {
    let state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    let records = state.records().records();
    let range = DateRange::from_bounds(args.range().from(), args.range().to(), records);
    let report = Report::build(records, range, args.top());
    Ok(Out::new(report.to_string(), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::RangeArgs;
    use crate::model::{Amount, RecordStore, SaleRecord};
    use crate::test::{date, TestEnv};

    async fn seed(env: &TestEnv) {
        let mut state = env.state().await;
        let _ = state.replace_records(RecordStore::from(vec![
            SaleRecord::new(date("2024-01-02"), "Chapo", 5, Amount::from(30), "Snacks", None),
            SaleRecord::new(date("2024-01-01"), "Soda", 2, Amount::from(50), "Drinks", None),
            SaleRecord::new(date("2024-01-01"), "Ndazi", 5, Amount::from(20), "Snacks", None),
            SaleRecord::new(date("2024-01-03"), "Tm", 1, Amount::from(30), "Snacks", None),
        ]));
        state.save_records().await.unwrap();
    }

    #[tokio::test]
    async fn test_report_all() {
        let env = TestEnv::new().await;
        seed(&env).await;
        let out = report(env.config(), ReportArgs::new(RangeArgs::default(), 3))
            .await
            .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.range, Some(DateRange::new(date("2024-01-01"), date("2024-01-03"))));
        assert_eq!(report.totals.total_sales, Amount::from(380));
        assert_eq!(report.totals.order_count, 4);
        assert_eq!(report.categories["Snacks"], Amount::from(280));
        let snacks: Vec<&str> = report.top_items[0]
            .items
            .iter()
            .map(|i| i.item.as_str())
            .collect();
        assert_eq!(report.top_items[0].category, "Snacks");
        assert_eq!(snacks, vec!["Chapo", "Ndazi", "Tm"]);
        assert_eq!(report.daily.len(), 3);
        assert!(out.message().starts_with("Sales report for 2024-01-01 to 2024-01-03"));
    }

    #[tokio::test]
    async fn test_report_open_range_and_reversed_range() {
        let env = TestEnv::new().await;
        seed(&env).await;
        let args = ReportArgs::new(RangeArgs::new(Some(date("2024-01-02")), None), 1);
        let report = report(env.config(), args).await.unwrap();
        let report = report.structure().unwrap();
        assert_eq!(report.totals.order_count, 2);
        assert_eq!(report.top_items[0].items.len(), 1);

        let args = ReportArgs::new(
            RangeArgs::new(Some(date("2024-01-03")), Some(date("2024-01-01"))),
            3,
        );
        let out = super::report(env.config(), args).await.unwrap();
        assert_eq!(out.structure().unwrap().totals.order_count, 0);
        assert!(out.message().ends_with("No sales in this period"));
    }

    #[tokio::test]
    async fn test_report_without_sales() {
        let env = TestEnv::new().await;
        let out = report(env.config(), ReportArgs::new(RangeArgs::default(), 3))
            .await
            .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.range, None);
        assert!(report.categories.is_empty());
        assert!(out.message().starts_with("Sales report\n"));
    }
}

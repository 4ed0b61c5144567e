//! These structs provide the CLI interface for the pos CLI.

use crate::api::layout::UnknownItemPolicy;
use crate::model::{Amount, RecordFilter};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// pos: record and report on the sales of a small food stall.
///
/// Sales are entered against a price list, kept in local JSON files under --pos-home and can be
/// synced with a Google sheet that has a price tab and a daily sales tab. The report command
/// summarizes sales by category, top items and day.
///
/// Set POS_SALES_IN_TEST_MODE to any value to sync against an in-memory sheet instead of Google.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration and data files.
    ///
    /// Run this first. The price catalog starts out as the house menu. --sheet-url is only needed
    /// if you want to use the sync command.
    Init(InitArgs),
    /// Show or edit the price catalog. Edits need the price password.
    Catalog(CatalogArgs),
    /// Stage several sales and record them all at once with `entry commit`.
    Entry(EntryArgs),
    /// Add, list, export or clear recorded sales.
    Sales(SalesArgs),
    /// Show totals, sales by category, top items and daily sales.
    Report(ReportArgs),
    /// Download the price and sales tabs from the sheet, or upload local data to them.
    Sync(SyncArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where pos data and configuration is held. Defaults to ~/pos
    #[arg(long, env = "POS_HOME", default_value_t = default_pos_home())]
    pos_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, pos_home: PathBuf) -> Self {
        Self {
            log_level,
            pos_home: pos_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn pos_home(&self) -> &DisplayPath {
        &self.pos_home
    }
}

/// (Not shown): Args for the `pos init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of the Google sheet to sync with. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1PosSa1es9kXq2TrVbHw7NcLm4ZdYe8GuJf3RiAo6Qp
    #[arg(long)]
    sheet_url: Option<String>,
}

impl InitArgs {
    pub fn new(sheet_url: Option<String>) -> Self {
        Self { sheet_url }
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.sheet_url.as_deref()
    }
}

/// (Not shown): Args for the `pos catalog` command.
#[derive(Debug, Parser, Clone)]
pub struct CatalogArgs {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

impl CatalogArgs {
    pub fn command(&self) -> &CatalogSubcommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CatalogSubcommand {
    /// Print every category, item and price.
    Show,
    /// Add an item to a category or change its price.
    SetPrice(SetPriceArgs),
    /// Remove an item from a category. Recorded sales of the item are kept.
    RemoveItem(RemoveItemArgs),
}

/// The password that unlocks catalog edits.
#[derive(Debug, Parser, Clone)]
pub struct PasswordArg {
    /// The price edit password.
    #[arg(long, env = "POS_PRICE_PASSWORD", hide_env_values = true)]
    password: String,
}

impl PasswordArg {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// (Not shown): Args for the `pos catalog set-price` command.
#[derive(Debug, Parser, Clone)]
pub struct SetPriceArgs {
    #[clap(flatten)]
    password: PasswordArg,

    /// The category, e.g. Snacks.
    #[arg(long)]
    category: String,

    /// The item name, e.g. Chapo.
    #[arg(long)]
    item: String,

    /// The unit price in KSh.
    #[arg(long)]
    price: Amount,
}

impl SetPriceArgs {
    pub fn new(
        password: impl Into<String>,
        category: impl Into<String>,
        item: impl Into<String>,
        price: Amount,
    ) -> Self {
        Self {
            password: PasswordArg::new(password),
            category: category.into(),
            item: item.into(),
            price,
        }
    }

    pub fn password(&self) -> &str {
        self.password.password()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn price(&self) -> Amount {
        self.price
    }
}

/// (Not shown): Args for the `pos catalog remove-item` command.
#[derive(Debug, Parser, Clone)]
pub struct RemoveItemArgs {
    #[clap(flatten)]
    password: PasswordArg,

    /// The category the item is listed in.
    #[arg(long)]
    category: String,

    /// The item name.
    #[arg(long)]
    item: String,
}

impl RemoveItemArgs {
    pub fn new(
        password: impl Into<String>,
        category: impl Into<String>,
        item: impl Into<String>,
    ) -> Self {
        Self {
            password: PasswordArg::new(password),
            category: category.into(),
            item: item.into(),
        }
    }

    pub fn password(&self) -> &str {
        self.password.password()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn item(&self) -> &str {
        &self.item
    }
}

/// (Not shown): Args for the `pos entry` command.
#[derive(Debug, Parser, Clone)]
pub struct EntryArgs {
    #[command(subcommand)]
    command: EntrySubcommand,
}

impl EntryArgs {
    pub fn command(&self) -> &EntrySubcommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum EntrySubcommand {
    /// Validate sales and add them to the staged entries.
    Add(EntryAddArgs),
    /// Show the staged entries and what committing them would add.
    List,
    /// Record every staged entry and empty the stage.
    Commit,
    /// Empty the stage without recording anything.
    Discard,
}

/// (Not shown): Args for the `pos entry add` command.
#[derive(Debug, Parser, Clone)]
pub struct EntryAddArgs {
    /// The day of the sales, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// A sale written as [CATEGORY:]ITEM=QTY[@PRICE], e.g. Snacks:Chapo=2 or Soda=1@60. When the
    /// category is left out the first category listing the item is used. When the price is left
    /// out the catalog price is used. May be repeated.
    #[arg(long = "entry", required = true)]
    entries: Vec<EntrySpec>,

    /// A note attached to every sale in this command.
    #[arg(long)]
    note: Option<String>,
}

impl EntryAddArgs {
    pub fn new(date: Option<NaiveDate>, entries: Vec<EntrySpec>, note: Option<String>) -> Self {
        Self {
            date,
            entries,
            note,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date.unwrap_or_else(today)
    }

    pub fn entries(&self) -> &[EntrySpec] {
        &self.entries
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

/// (Not shown): Args for the `pos sales` command.
#[derive(Debug, Parser, Clone)]
pub struct SalesArgs {
    #[command(subcommand)]
    command: SalesSubcommand,
}

impl SalesArgs {
    pub fn command(&self) -> &SalesSubcommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum SalesSubcommand {
    /// Validate one sale and record it straight away.
    Add(SalesAddArgs),
    /// List recorded sales, optionally narrowed by date, category and item.
    List(SalesListArgs),
    /// Write recorded sales as CSV.
    Export(ExportArgs),
    /// Delete every recorded sale. A backup is written first.
    Clear,
}

/// (Not shown): Args for the `pos sales add` command.
#[derive(Debug, Parser, Clone)]
pub struct SalesAddArgs {
    /// The day of the sale, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// The sale written as [CATEGORY:]ITEM=QTY[@PRICE], e.g. Snacks:Chapo=2.
    #[arg(long)]
    entry: EntrySpec,

    /// A note attached to the sale.
    #[arg(long)]
    note: Option<String>,
}

impl SalesAddArgs {
    pub fn new(date: Option<NaiveDate>, entry: EntrySpec, note: Option<String>) -> Self {
        Self { date, entry, note }
    }

    pub fn date(&self) -> NaiveDate {
        self.date.unwrap_or_else(today)
    }

    pub fn entry(&self) -> &EntrySpec {
        &self.entry
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

/// (Not shown): Args for the `pos sales list` command.
#[derive(Debug, Parser, Clone)]
pub struct SalesListArgs {
    /// Only sales on this day.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Only sales in this category.
    #[arg(long)]
    category: Option<String>,

    /// Only sales of this item.
    #[arg(long)]
    item: Option<String>,
}

impl SalesListArgs {
    pub fn new(date: Option<NaiveDate>, category: Option<String>, item: Option<String>) -> Self {
        Self {
            date,
            category,
            item,
        }
    }

    pub fn filter(&self) -> RecordFilter {
        RecordFilter {
            date: self.date,
            category: self.category.clone(),
            item: self.item.clone(),
        }
    }
}

/// (Not shown): Args for the `pos sales export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    #[clap(flatten)]
    range: RangeArgs,

    /// Only sales in this category.
    #[arg(long)]
    category: Option<String>,

    /// Only sales of this item.
    #[arg(long)]
    item: Option<String>,

    /// The file to write. Without it the CSV goes to stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(
        range: RangeArgs,
        category: Option<String>,
        item: Option<String>,
        output: Option<PathBuf>,
    ) -> Self {
        Self {
            range,
            category,
            item,
            output,
        }
    }

    pub fn range(&self) -> &RangeArgs {
        &self.range
    }

    /// The category and item constraints. Dates are handled by `range`.
    pub fn filter(&self) -> RecordFilter {
        RecordFilter {
            date: None,
            category: self.category.clone(),
            item: self.item.clone(),
        }
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/// Optional inclusive date bounds. A missing bound is taken from the earliest or latest sale.
#[derive(Debug, Default, Parser, Clone)]
pub struct RangeArgs {
    /// The first day to include, YYYY-MM-DD.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// The last day to include, YYYY-MM-DD.
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl RangeArgs {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }
}

/// (Not shown): Args for the `pos report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    #[clap(flatten)]
    range: RangeArgs,

    /// How many items to rank per category.
    #[arg(long, default_value_t = crate::report::DEFAULT_TOP_N)]
    top: usize,
}

impl ReportArgs {
    pub fn new(range: RangeArgs, top: usize) -> Self {
        Self { range, top }
    }

    pub fn range(&self) -> &RangeArgs {
        &self.range
    }

    pub fn top(&self) -> usize {
        self.top
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpDown {
    Up,
    #[default]
    Down,
}

serde_plain::derive_display_from_serialize!(UpDown);
serde_plain::derive_fromstr_from_deserialize!(UpDown);

/// Which tabs a sync touches.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTarget {
    Sales,
    Prices,
    #[default]
    All,
}

serde_plain::derive_display_from_serialize!(SyncTarget);
serde_plain::derive_fromstr_from_deserialize!(SyncTarget);

impl SyncTarget {
    pub fn prices(self) -> bool {
        matches!(self, SyncTarget::Prices | SyncTarget::All)
    }

    pub fn sales(self) -> bool {
        matches!(self, SyncTarget::Sales | SyncTarget::All)
    }
}

/// (Not shown): Args for the `pos sync` command.
#[derive(Debug, Parser, Clone)]
pub struct SyncArgs {
    /// The direction to sync: "up" or "down"
    direction: UpDown,

    /// What to sync: "sales", "prices" or "all". When downloading both, prices go first so that
    /// sales are priced from the new price list.
    #[arg(default_value_t = SyncTarget::All)]
    target: SyncTarget,

    /// What to do with sales of items that have no price when downloading.
    #[arg(long, value_enum, default_value_t = UnknownItemPolicy::Skip)]
    unknown_items: UnknownItemPolicy,
}

impl SyncArgs {
    pub fn new(direction: UpDown, target: SyncTarget, unknown_items: UnknownItemPolicy) -> Self {
        Self {
            direction,
            target,
            unknown_items,
        }
    }

    pub fn direction(&self) -> UpDown {
        self.direction
    }

    pub fn target(&self) -> SyncTarget {
        self.target
    }

    pub fn unknown_items(&self) -> UnknownItemPolicy {
        self.unknown_items
    }
}

/// One sale as typed on the command line: `[CATEGORY:]ITEM=QTY[@PRICE]`.
///
/// The quantity is kept as text so that a bad quantity is reported by sale validation, like any
/// other bad input, rather than by the argument parser.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EntrySpec {
    category: Option<String>,
    item: String,
    quantity: String,
    price: Option<Amount>,
}

impl EntrySpec {
    pub fn new(
        category: Option<String>,
        item: impl Into<String>,
        quantity: impl Into<String>,
        price: Option<Amount>,
    ) -> Self {
        Self {
            category,
            item: item.into(),
            quantity: quantity.into(),
            price,
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn price(&self) -> Option<Amount> {
        self.price
    }
}

impl FromStr for EntrySpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((left, right)) = s.split_once('=') else {
            return Err(format!(
                "'{s}' should look like [CATEGORY:]ITEM=QTY[@PRICE], e.g. Snacks:Chapo=2"
            ));
        };
        let (category, item) = match left.split_once(':') {
            Some((category, item)) => (Some(category.trim().to_string()), item.trim()),
            None => (None, left.trim()),
        };
        let (quantity, price) = match right.split_once('@') {
            Some((quantity, price)) => {
                let price = Amount::from_str(price)
                    .map_err(|e| format!("Invalid price '{}' in '{s}': {e}", price.trim()))?;
                (quantity.trim(), Some(price))
            }
            None => (right.trim(), None),
        };
        Ok(Self::new(category, item, quantity, price))
    }
}

impl Display for EntrySpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(category) = &self.category {
            write!(f, "{category}:")?;
        }
        write!(f, "{}={}", self.item, self.quantity)?;
        if let Some(price) = &self.price {
            write!(f, "@{}", price.plain())?;
        }
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn default_pos_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("pos"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --pos-home or POS_HOME instead of relying on the default \
                pos home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("pos")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_spec_full() {
        let spec = EntrySpec::from_str("Snacks:Chapo=2@35").unwrap();
        assert_eq!(spec.category(), Some("Snacks"));
        assert_eq!(spec.item(), "Chapo");
        assert_eq!(spec.quantity(), "2");
        assert_eq!(spec.price(), Some(Amount::from(35)));
        assert_eq!(spec.to_string(), "Snacks:Chapo=2@35");
    }

    #[test]
    fn test_entry_spec_minimal() {
        let spec = EntrySpec::from_str(" Soda = 1 ").unwrap();
        assert_eq!(spec.category(), None);
        assert_eq!(spec.item(), "Soda");
        assert_eq!(spec.quantity(), "1");
        assert_eq!(spec.price(), None);
    }

    #[test]
    fn test_entry_spec_keeps_bad_quantity_for_validation() {
        let spec = EntrySpec::from_str("No. cups of tea:Tea=two").unwrap();
        assert_eq!(spec.category(), Some("No. cups of tea"));
        assert_eq!(spec.quantity(), "two");
    }

    #[test]
    fn test_entry_spec_errors() {
        assert!(EntrySpec::from_str("Chapo").is_err());
        assert!(EntrySpec::from_str("Chapo=1@cheap").is_err());
    }

    #[test]
    fn test_parse_sync_args() {
        let args = Args::try_parse_from([
            "pos",
            "--pos-home",
            "/tmp/pos",
            "sync",
            "down",
            "prices",
            "--unknown-items",
            "zero-price",
        ])
        .unwrap();
        assert_eq!(args.common().pos_home().path(), Path::new("/tmp/pos"));
        let Command::Sync(sync) = args.command() else {
            panic!("expected sync");
        };
        assert_eq!(sync.direction(), UpDown::Down);
        assert_eq!(sync.target(), SyncTarget::Prices);
        assert_eq!(sync.unknown_items(), UnknownItemPolicy::ZeroPrice);
    }

    #[test]
    fn test_parse_entry_add_repeats() {
        let args = Args::try_parse_from([
            "pos",
            "entry",
            "add",
            "--date",
            "2024-01-01",
            "--entry",
            "Chapo=2",
            "--entry",
            "Drinks:Soda=1@50",
        ])
        .unwrap();
        let Command::Entry(entry) = args.command() else {
            panic!("expected entry");
        };
        let EntrySubcommand::Add(add) = entry.command() else {
            panic!("expected entry add");
        };
        assert_eq!(add.entries().len(), 2);
        assert_eq!(
            add.date(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }
}

use clap::Parser;
use pos_sales::args::{
    Args, CatalogSubcommand, Command, EntrySubcommand, SalesSubcommand, UpDown,
};
use pos_sales::{commands, Config, Mode, Result};
use std::io::Write;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().pos_home().path();

    // When POS_SALES_IN_TEST_MODE is set and non-empty the mode is Mode::Test and no Google API
    // is called, otherwise it is Mode::Google.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.sheet_url()).await?.print(),

        Command::Catalog(catalog_args) => {
            let config = Config::load(home).await?;
            match catalog_args.command() {
                CatalogSubcommand::Show => commands::catalog_show(config).await?.print(),
                CatalogSubcommand::SetPrice(args) => {
                    commands::set_price(config, args.clone()).await?.print()
                }
                CatalogSubcommand::RemoveItem(args) => {
                    commands::remove_item(config, args.clone()).await?.print()
                }
            }
        }

        Command::Entry(entry_args) => {
            let config = Config::load(home).await?;
            match entry_args.command() {
                EntrySubcommand::Add(args) => {
                    commands::entry_add(config, args.clone()).await?.print()
                }
                EntrySubcommand::List => commands::entry_list(config).await?.print(),
                EntrySubcommand::Commit => commands::entry_commit(config).await?.print(),
                EntrySubcommand::Discard => commands::entry_discard(config).await?.print(),
            }
        }

        Command::Sales(sales_args) => {
            let config = Config::load(home).await?;
            match sales_args.command() {
                SalesSubcommand::Add(args) => {
                    commands::sales_add(config, args.clone()).await?.print()
                }
                SalesSubcommand::List(args) => {
                    commands::sales_list(config, args.clone()).await?.print()
                }
                SalesSubcommand::Export(args) => {
                    let out = commands::sales_export(config, args.clone()).await?;
                    if let Some(csv) = out.structure().and_then(|e| e.csv.as_deref()) {
                        let mut stdout = std::io::stdout().lock();
                        if let Err(e) = stdout.write_all(csv.as_bytes()) {
                            error!("Unable to write the CSV to stdout: {e}");
                        }
                    }
                    out.print()
                }
                SalesSubcommand::Clear => commands::sales_clear(config).await?.print(),
            }
        }

        Command::Report(report_args) => {
            let config = Config::load(home).await?;
            commands::report(config, report_args.clone()).await?.print()
        }

        Command::Sync(sync_args) => {
            let config = Config::load(home).await?;
            match sync_args.direction() {
                UpDown::Up => commands::sync_up(config, mode, sync_args.target())
                    .await?
                    .print(),
                UpDown::Down => commands::sync_down(
                    config,
                    mode,
                    sync_args.target(),
                    sync_args.unknown_items(),
                )
                .await?
                .print(),
            }
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for the binary and library only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use rates_core::GroupKey;
use rust_decimal::Decimal;
use tracing::debug;

use rates_cli::utils::{
    parse_group_discount, parse_percent, parse_price_override, parse_transport_charge,
};
use rates_cli::{ExportFormat, RatesConfig, RunOptions, logging, render_summary, run};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Net hire-rate price list generator.
///
/// Loads a rate sheet, applies the global, group and per-item pricing given
/// on the command line (optionally on top of saved progress), prints the
/// resolved price list and writes the requested exports.
#[derive(Debug, Parser)]
#[command(name = "net-rates", version)]
struct Cli {
    /// Rate sheet CSV.
    catalog: PathBuf,

    /// Configuration file (defaults to `net-rates.toml` when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Saved progress file, by name, in the snapshot directory.
    #[arg(long)]
    restore: Option<String>,

    /// Customer the price list is for.
    #[arg(long)]
    customer: Option<String>,

    /// Drop every custom price before applying `--price`.
    #[arg(long)]
    reset_prices: bool,

    /// Global discount percentage.
    #[arg(long, value_parser = parse_percent)]
    global_discount: Option<Decimal>,

    /// Reset every group discount to the global one.
    #[arg(long)]
    reset_groups: bool,

    /// Group discount as `GROUP/SUB SECTION=PERCENT`. Repeatable.
    #[arg(long = "group-discount", value_parser = parse_group_discount)]
    group_discounts: Vec<(GroupKey, Decimal)>,

    /// Custom price as `ITEM=PRICE` (`POA` allowed, empty clears). Repeatable.
    #[arg(long = "price", value_parser = parse_price_override)]
    prices: Vec<(String, String)>,

    /// Transport charge as `POSITION=CHARGE`, counting from 0. Repeatable.
    #[arg(long = "transport", value_parser = parse_transport_charge)]
    transport: Vec<(usize, String)>,

    /// Export to write. Repeatable.
    #[arg(long = "export", value_enum)]
    exports: Vec<ExportFormat>,

    /// Directory exports are written to.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    /// Save progress to the snapshot directory after applying edits.
    #[arg(long)]
    save: bool,

    /// Log filter, e.g. `debug` or `rates_core=trace`. Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    logging::init_default_logging();

    let cli = Cli::parse();

    if let Some(level) = &cli.log_level {
        logging::set_log_level(level)?;
    }
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    let config = RatesConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    debug!(snapshot_dir = %config.storage.snapshot_dir.display(), "configuration ready");

    let options = RunOptions {
        catalog: cli.catalog,
        restore: cli.restore,
        customer: cli.customer,
        reset_overrides: cli.reset_prices,
        global_discount: cli.global_discount,
        reset_group_discounts: cli.reset_groups,
        group_discounts: cli.group_discounts,
        prices: cli.prices,
        transport: cli.transport,
        export_dir: cli.export_dir,
        formats: cli.exports,
        save: cli.save,
    };

    let report = run(&options, &config, Utc::now())?;
    print!("{}", render_summary(&report, &config.app.currency_symbol));

    Ok(())
}

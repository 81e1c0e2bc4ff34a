//! One `net-rates` run: load a rate sheet, apply the operator's edits, write
//! the price list and optionally save progress.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use rates_core::snapshot::customer_slug;
use rates_core::{
    Catalog, EditingSession, ExportFormatter, GroupKey, PriceStyle, ReconciliationReport,
    ResolvedLineItem, SnapshotStore, TransportRow,
};
use rates_data::{
    CatalogLoader, FileSnapshotStore, PriceListDocument, write_admin_csv, write_csv, write_json,
    write_transport_csv, write_xlsx,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::RatesConfig;

/// Output files a run can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Customer price list as CSV.
    Csv,
    /// Internal copy with customer name and creation time columns.
    Admin,
    /// Transport charges as CSV.
    Transport,
    /// Price list and transport charges as one JSON document.
    Json,
    /// Excel workbook with price list and transport sheets.
    Xlsx,
}

impl ExportFormat {
    fn file_name(
        self,
        slug: &str,
    ) -> String {
        match self {
            ExportFormat::Csv => format!("{slug}_price_list.csv"),
            ExportFormat::Admin => format!("{slug}_price_list_admin.csv"),
            ExportFormat::Transport => format!("{slug}_transport.csv"),
            ExportFormat::Json => format!("{slug}_price_list.json"),
            ExportFormat::Xlsx => format!("{slug}_price_list.xlsx"),
        }
    }
}

/// Everything the operator asked for on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub catalog: PathBuf,
    /// Snapshot file name inside the snapshot directory to start from.
    pub restore: Option<String>,
    pub customer: Option<String>,
    pub reset_overrides: bool,
    pub global_discount: Option<Decimal>,
    /// Also reset every group discount to the global one.
    pub reset_group_discounts: bool,
    pub group_discounts: Vec<(GroupKey, Decimal)>,
    pub prices: Vec<(String, String)>,
    pub transport: Vec<(usize, String)>,
    pub export_dir: PathBuf,
    pub formats: Vec<ExportFormat>,
    pub save: bool,
}

/// What a run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub customer_name: String,
    pub lines: Vec<ResolvedLineItem>,
    pub transport: Vec<TransportRow>,
    pub reconciliation: Option<ReconciliationReport>,
    pub cleared_overrides: usize,
    pub written: Vec<PathBuf>,
    pub saved_snapshot: Option<String>,
}

/// Applies restore and edits in command-line order of precedence: restored
/// state first, then resets, then discounts, then individual prices.
fn build_session(
    options: &RunOptions,
    config: &RatesConfig,
    catalog: &Catalog,
    store: &FileSnapshotStore,
) -> Result<(EditingSession, Option<ReconciliationReport>, usize)> {
    let mut session = EditingSession::new(config.transport.clone());
    session
        .set_global_discount(config.app.default_discount)
        .context("invalid default discount")?;

    let reconciliation = match &options.restore {
        Some(name) => {
            let report = store
                .restore_session(name, &mut session, catalog)
                .with_context(|| format!("failed to restore snapshot '{name}'"))?;
            for key in &report.unmatched_keys {
                warn!(item = %key, "saved price has no matching item in the rate sheet");
            }
            Some(report)
        }
        None => None,
    };

    if let Some(customer) = &options.customer {
        session.customer_name = customer.trim().to_string();
    }

    let cleared = if options.reset_overrides { session.reset_overrides() } else { 0 };

    match (options.global_discount, options.reset_group_discounts) {
        (Some(percent), true) => session.apply_global_discount(percent)?,
        (Some(percent), false) => session.set_global_discount(percent)?,
        (None, true) => {
            let current = session.discounts.global_discount_percent;
            session.apply_global_discount(current)?
        }
        (None, false) => {}
    }

    let known_groups = catalog.group_keys();
    for (key, percent) in &options.group_discounts {
        if !known_groups.contains(key) {
            warn!(group = %key, "group discount for a group not in the rate sheet");
        }
        session.set_group_discount(key.clone(), *percent)?;
    }

    for (item_key, raw) in &options.prices {
        if !catalog.contains_key(item_key) {
            warn!(item = %item_key, "custom price for an item not in the rate sheet");
        }
        session.set_custom_price(item_key.as_str(), raw.as_str());
    }

    for (position, raw) in &options.transport {
        session.set_transport_charge(*position, raw.as_str())?;
    }

    Ok((session, reconciliation, cleared))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("cannot create '{}'", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_exports(
    session: &EditingSession,
    lines: &[ResolvedLineItem],
    transport: &[TransportRow],
    options: &RunOptions,
    now: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    if options.formats.is_empty() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(&options.export_dir)
        .with_context(|| format!("cannot create '{}'", options.export_dir.display()))?;

    let slug = customer_slug(&session.customer_name);
    let created = now.with_timezone(&Local).naive_local();
    let records = ExportFormatter::to_records(lines);
    let transport_records = ExportFormatter::to_transport_records(transport);

    let mut written = Vec::new();
    for format in &options.formats {
        let path = options.export_dir.join(format.file_name(&slug));
        match format {
            ExportFormat::Csv => write_csv(create(&path)?, &records)?,
            ExportFormat::Admin => {
                let admin =
                    ExportFormatter::to_admin_records(lines, &session.customer_name, created);
                write_admin_csv(create(&path)?, &admin)?
            }
            ExportFormat::Transport => write_transport_csv(create(&path)?, &transport_records)?,
            ExportFormat::Json => {
                let document = PriceListDocument {
                    customer_name: &session.customer_name,
                    date_created: created.format("%Y-%m-%d %H:%M").to_string(),
                    items: &records,
                    transport_charges: &transport_records,
                };
                write_json(create(&path)?, &document)?
            }
            ExportFormat::Xlsx => write_xlsx(&path, &records, &transport_records)?,
        }
        info!(path = %path.display(), "export written");
        written.push(path);
    }
    Ok(written)
}

/// Runs the whole pipeline. `now` stamps exports and the saved snapshot.
pub fn run(
    options: &RunOptions,
    config: &RatesConfig,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    let catalog = CatalogLoader::load_from_file(&options.catalog)
        .with_context(|| format!("failed to load rate sheet '{}'", options.catalog.display()))?;
    let mut store = FileSnapshotStore::new(&config.storage.snapshot_dir);

    let (session, reconciliation, cleared_overrides) =
        build_session(options, config, &catalog, &store)?;

    let lines = session.resolve(&catalog);
    let transport = session.transport_rows();
    let written = write_exports(&session, &lines, &transport, options, now)?;

    let saved_snapshot = if options.save {
        let name = store
            .save_session(&session, now)
            .context("failed to save progress")?;
        Some(name)
    } else {
        None
    };

    Ok(RunReport {
        customer_name: session.customer_name,
        lines,
        transport,
        reconciliation,
        cleared_overrides,
        written,
        saved_snapshot,
    })
}

/// Plain-text summary printed after a run.
pub fn render_summary(
    report: &RunReport,
    currency_symbol: &str,
) -> String {
    let style = PriceStyle::Display(currency_symbol);
    let mut out = String::new();

    if !report.customer_name.is_empty() {
        let _ = writeln!(out, "Customer: {}", report.customer_name);
    }
    if let Some(reconciliation) = &report.reconciliation {
        let _ = writeln!(
            out,
            "Restored {} custom price(s); {} no longer in the rate sheet",
            reconciliation.matched_count, reconciliation.unmatched_count
        );
    }
    if report.cleared_overrides > 0 {
        let _ = writeln!(out, "Cleared {} custom price(s)", report.cleared_overrides);
    }

    let _ = writeln!(
        out,
        "{:<12} {:<32} {:>12} {:>12} {:>9}",
        "Item", "Equipment", "Original", "Net", "Discount"
    );
    for line in &report.lines {
        let discount = match line.discount_percent.rounded_amount() {
            Some(pct) => format!("{pct:.2}%"),
            None => line.discount_percent.format(style),
        };
        let _ = writeln!(
            out,
            "{:<12} {:<32} {:>12} {:>12} {:>9}{}",
            line.item.item_key,
            line.item.name,
            line.item.base_rate.format(style),
            line.resolved_price.format(style),
            discount,
            if line.exceeds_max_discount { " !" } else { "" }
        );
    }

    if !report.transport.is_empty() {
        let _ = writeln!(out, "\nTransport");
        for record in ExportFormatter::to_transport_records(&report.transport) {
            let symbol = if record.charge.amount.is_some() { currency_symbol } else { "" };
            let _ = writeln!(
                out,
                "  {:<30} {symbol}{}",
                record.transport_type, record.charge.text
            );
        }
    }

    let warnings: Vec<_> = report.lines.iter().flat_map(|l| l.warnings()).collect();
    if !warnings.is_empty() {
        let _ = writeln!(out, "\nWarnings");
        for warning in warnings {
            let _ = writeln!(out, "  {warning}");
        }
    }

    for path in &report.written {
        let _ = writeln!(out, "Wrote {}", path.display());
    }
    if let Some(name) = &report.saved_snapshot {
        let _ = writeln!(out, "Saved progress as {name}");
    }
    out
}

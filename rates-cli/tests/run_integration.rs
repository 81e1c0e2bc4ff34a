//! End-to-end runs against an on-disk rate sheet, writing exports and
//! snapshots into per-test scratch directories.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rates_cli::{ExportFormat, RatesConfig, RunOptions, render_summary, run};
use rates_core::{GroupKey, PriceValue, SessionError, SnapshotError};
use rust_decimal_macros::dec;

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("rate_sheet.csv")
}

/// A fresh, empty directory for one test.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn config_for(dir: &Path) -> RatesConfig {
    let mut config = RatesConfig::default();
    config.storage.snapshot_dir = dir.join("progress");
    config
}

fn saved_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
}

fn edited_options(dir: &Path) -> RunOptions {
    RunOptions {
        catalog: fixture_path(),
        customer: Some("Acme Ltd".to_string()),
        global_discount: Some(dec!(10)),
        group_discounts: vec![(GroupKey::new("Access", "Towers"), dec!(25))],
        prices: vec![("B-1".to_string(), "45".to_string())],
        transport: vec![(1, "9".to_string())],
        export_dir: dir.join("out"),
        ..Default::default()
    }
}

#[test]
fn test_run_resolves_and_writes_every_export() {
    let dir = scratch_dir("run_exports");
    let options = RunOptions {
        formats: vec![
            ExportFormat::Csv,
            ExportFormat::Admin,
            ExportFormat::Transport,
            ExportFormat::Json,
            ExportFormat::Xlsx,
        ],
        ..edited_options(&dir)
    };

    let report = run(&options, &config_for(&dir), saved_at()).expect("run should succeed");

    let out = dir.join("out");
    assert_eq!(
        report.written,
        vec![
            out.join("Acme_Ltd_price_list.csv"),
            out.join("Acme_Ltd_price_list_admin.csv"),
            out.join("Acme_Ltd_transport.csv"),
            out.join("Acme_Ltd_price_list.json"),
            out.join("Acme_Ltd_price_list.xlsx"),
        ]
    );

    let csv = std::fs::read_to_string(out.join("Acme_Ltd_price_list.csv")).unwrap();
    assert_eq!(
        csv.lines().collect::<Vec<_>>(),
        vec![
            "ItemCategory,EquipmentName,OriginalPrice,NetPrice,DiscountPercent,Group,SubSection",
            "A-2,Podium,40.00,36.00,10.00,Access,Podiums",
            "A-1,Tower 5m,100.00,75.00,25.00,Access,Towers",
            "B-1,Breaker,60.00,45.00,25.00,Breaking,Hammers",
            "P-1,Excavator,POA,POA,POA,Plant,Excavators",
        ]
    );

    let transport = std::fs::read_to_string(out.join("Acme_Ltd_transport.csv")).unwrap();
    assert!(transport.contains("Towables,9.00\n"));
    assert!(transport.contains("Powered Access,Negotiable\n"));

    let admin = std::fs::read_to_string(out.join("Acme_Ltd_price_list_admin.csv")).unwrap();
    assert!(admin.lines().nth(1).unwrap().starts_with("Acme Ltd,"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("Acme_Ltd_price_list.json")).unwrap())
            .unwrap();
    assert_eq!(json["customer_name"], "Acme Ltd");
    assert_eq!(json["items"][1]["NetPrice"], "75.00");

    let xlsx = std::fs::read(out.join("Acme_Ltd_price_list.xlsx")).unwrap();
    assert_eq!(&xlsx[..2], b"PK");
}

#[test]
fn test_saved_progress_restores_in_a_later_run() {
    let dir = scratch_dir("run_save_restore");
    let config = config_for(&dir);
    let first = run(
        &RunOptions {
            save: true,
            ..edited_options(&dir)
        },
        &config,
        saved_at(),
    )
    .unwrap();
    let name = first.saved_snapshot.clone().expect("progress should be saved");

    let second = run(
        &RunOptions {
            catalog: fixture_path(),
            restore: Some(name.clone()),
            ..Default::default()
        },
        &config,
        saved_at(),
    )
    .unwrap();

    assert_eq!(name, "progress_Acme_Ltd_20250301_093000.json");
    assert_eq!(second.customer_name, "Acme Ltd");
    let reconciliation = second.reconciliation.expect("restore reports reconciliation");
    assert_eq!(reconciliation.matched_count, 1);
    assert_eq!(reconciliation.unmatched_count, 0);
    let prices = |lines: &[rates_core::ResolvedLineItem]| -> Vec<PriceValue> {
        lines.iter().map(|l| l.resolved_price.clone()).collect()
    };
    assert_eq!(prices(&second.lines), prices(&first.lines));
    assert_eq!(second.transport, first.transport);
}

#[test]
fn test_saving_twice_in_the_same_second_does_not_overwrite() {
    let dir = scratch_dir("run_save_twice");
    let config = config_for(&dir);
    let options = RunOptions {
        save: true,
        ..edited_options(&dir)
    };
    run(&options, &config, saved_at()).unwrap();

    let err = run(&options, &config, saved_at()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SnapshotError>(),
        Some(SnapshotError::AlreadyExists(_))
    ));
}

#[test]
fn test_reset_prices_clears_restored_overrides() {
    let dir = scratch_dir("run_reset_prices");
    let config = config_for(&dir);
    let name = run(
        &RunOptions {
            save: true,
            ..edited_options(&dir)
        },
        &config,
        saved_at(),
    )
    .unwrap()
    .saved_snapshot
    .unwrap();

    let report = run(
        &RunOptions {
            catalog: fixture_path(),
            restore: Some(name),
            reset_overrides: true,
            ..Default::default()
        },
        &config,
        saved_at(),
    )
    .unwrap();

    assert_eq!(report.cleared_overrides, 1);
    // B-1 falls back to the restored 10% global discount.
    assert_eq!(report.lines[2].resolved_price, PriceValue::Numeric(dec!(54.00)));
}

#[test]
fn test_reset_groups_brings_every_group_back_to_global() {
    let dir = scratch_dir("run_reset_groups");
    let options = RunOptions {
        reset_group_discounts: true,
        group_discounts: Vec::new(),
        ..edited_options(&dir)
    };

    let report = run(&options, &config_for(&dir), saved_at()).unwrap();

    // Tower 5m follows the 10% global discount.
    assert_eq!(report.lines[1].resolved_price, PriceValue::Numeric(dec!(90.00)));
}

#[test]
fn test_missing_snapshot_fails_the_run() {
    let dir = scratch_dir("run_missing_snapshot");
    let options = RunOptions {
        catalog: fixture_path(),
        restore: Some("progress_nobody.json".to_string()),
        ..Default::default()
    };

    let err = run(&options, &config_for(&dir), saved_at()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SnapshotError>(),
        Some(SnapshotError::NotFound(_))
    ));
}

#[test]
fn test_locked_transport_charge_is_rejected() {
    let dir = scratch_dir("run_locked_transport");
    let options = RunOptions {
        transport: vec![(5, "20".to_string())],
        ..edited_options(&dir)
    };

    let err = run(&options, &config_for(&dir), saved_at()).unwrap_err();

    assert_eq!(
        err.downcast_ref::<SessionError>(),
        Some(&SessionError::LockedTransport("Powered Access".to_string()))
    );
}

#[test]
fn test_summary_uses_configured_currency_and_lists_warnings() {
    let dir = scratch_dir("run_summary");

    let report = run(&edited_options(&dir), &config_for(&dir), saved_at()).unwrap();
    let summary = render_summary(&report, "€");

    assert!(summary.starts_with("Customer: Acme Ltd\n"));
    assert!(summary.contains("€75.00"));
    assert!(summary.contains("B-1: discount 25.00% exceeds the 10% maximum"));
    assert!(summary.contains("Towables                       €9.00\n"));
    assert!(summary.contains("Standard - small tools         €5.00\n"));
    assert!(summary.contains("Powered Access                 Negotiable\n"));
    assert!(report.written.is_empty());
}

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use pv_report_sync::config::{OutputMode, SentinelPolicy};
use pv_report_sync::models::{ParsedRecord, Reading, ReportFormat};
use pv_report_sync::processors::Scheduler;
use pv_report_sync::readers::{DiscoveryMode, ReportReader, StationDiscovery};
use pv_report_sync::workbook::{with_session, OpenOptions};
use pv_report_sync::writers::SheetWriter;
use pv_report_sync::SyncConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use umya_spreadsheet::{reader, writer};

const SHEET: &str = "Produção";

fn create_workbook(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut book = umya_spreadsheet::new_file();
    book.new_sheet(SHEET).unwrap();
    let sheet = book.get_sheet_by_name_mut(SHEET).unwrap();
    sheet.get_cell_mut("A1").set_value("Registos de Produção PV");
    sheet.get_cell_mut("A13").set_value("dia 1");
    writer::xlsx::write(&book, path).unwrap();
}

fn cell_number(path: &Path, column: u32, row: u32) -> Option<f64> {
    let book = reader::xlsx::read(path).unwrap();
    book.get_sheet_by_name(SHEET)
        .unwrap()
        .get_cell((column, row))
        .and_then(|cell| cell.get_value_number())
}

fn test_config() -> SyncConfig {
    SyncConfig {
        sheet_name: SHEET.to_string(),
        output: OutputMode::InPlace,
        target_month: Some("2023-05".to_string()),
        ..SyncConfig::default()
    }
}

#[test]
fn test_discovery_to_workbook_end_to_end() {
    let root = TempDir::new().expect("Failed to create temp directory");
    let reports = root.path().join("reports");
    let excel = root.path().join("excel");
    fs::create_dir_all(&reports).unwrap();

    let alpha = excel.join("norte/Registos de Produção PV ALPHA.xlsx");
    let beta = excel.join("sul/Registos de Produção PV BETA.xlsx");
    let gamma = excel.join("sul/Registos de Produção PV GAMMA.xlsx");
    for path in [&alpha, &beta, &gamma] {
        create_workbook(path);
    }
    fs::write(reports.join("ALPHA.log"), "[2023-05-10]: 4.2\n[2023-05-11]: ---\n").unwrap();
    fs::write(reports.join("GAMMA.log"), "[2023-05-01]: 12.5\n").unwrap();

    let config = test_config();
    let mappings = StationDiscovery::from_config(&config)
        .unwrap()
        .discover(DiscoveryMode::Workbooks, &reports, &[excel.clone()])
        .unwrap();

    let ids: Vec<&str> = mappings.iter().map(|m| m.station_id.as_str()).collect();
    assert_eq!(ids, vec!["ALPHA", "BETA", "GAMMA"]);
    assert_eq!(mappings[0].workbook_path, alpha);

    let mut scheduler = Scheduler::new(&config).unwrap();
    let summary = with_session(|session| scheduler.run(session, &mappings, None)).unwrap();

    assert_eq!(summary.processed, vec!["ALPHA", "GAMMA"]);
    assert_eq!(summary.missing_reports, vec!["BETA"]);
    assert!(summary.failures.is_empty());

    let mapper = config.mapper();
    let may = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
    let column = mapper.column_for(may) as u32;
    assert_eq!(column, 86);
    assert_eq!(cell_number(&alpha, column, 22), Some(4.2));
    assert_eq!(cell_number(&alpha, column, 23), None);
    assert_eq!(cell_number(&gamma, column, 13), Some(12.5));
}

#[test]
fn test_positional_report_refreshes_month_column() {
    let root = TempDir::new().unwrap();
    let reports = root.path().join("reports");
    let excel = root.path().join("excel");
    fs::create_dir_all(&reports).unwrap();
    fs::write(reports.join("ALPHA.txt"), "1.5\n2.5\nerro\n4\n").unwrap();

    let config = SyncConfig {
        report_extension: "txt".to_string(),
        sentinel: SentinelPolicy::Zero,
        ..test_config()
    };
    let mappings = StationDiscovery::from_config(&config)
        .unwrap()
        .discover(DiscoveryMode::Reports, &reports, &[excel.clone()])
        .unwrap();
    assert_eq!(mappings.len(), 1);

    let workbook = excel.join("ALPHA/Registos_de_Producao_PV_ALPHA.xlsx");
    assert_eq!(mappings[0].workbook_path, workbook);
    create_workbook(&workbook);

    let mut scheduler = Scheduler::new(&config).unwrap();
    let summary = with_session(|session| scheduler.run(session, &mappings, None)).unwrap();
    assert_eq!(summary.processed, vec!["ALPHA"]);

    let values: Vec<Option<f64>> = (13..=16).map(|row| cell_number(&workbook, 86, row)).collect();
    assert_eq!(values, vec![Some(1.5), Some(2.5), Some(0.0), Some(4.0)]);
    assert_eq!(cell_number(&workbook, 86, 17), None);
}

#[test]
fn test_rewriting_same_report_is_idempotent() {
    let root = TempDir::new().unwrap();
    let workbook = root.path().join("Registos de Produção PV ALPHA.xlsx");
    let report = root.path().join("ALPHA.log");
    create_workbook(&workbook);
    fs::write(&report, "[2023-05-10]: 4.2\n[2023-05-12]: 3\n").unwrap();

    let config = test_config();
    let writer = SheetWriter::from_config(&config);
    let records = ReportReader::new()
        .read(&report, "ALPHA", ReportFormat::Dated)
        .unwrap();
    let month = config.target_month().unwrap();

    let snapshot = || -> Vec<Option<f64>> {
        (13..=44).map(|row| cell_number(&workbook, 86, row)).collect()
    };

    let mut runs = Vec::new();
    for _ in 0..2 {
        with_session(|session| {
            let mut handle = session.open(&workbook, OpenOptions::default())?;
            writer.write(&mut handle, &records, month)?;
            handle.close(false)
        })
        .unwrap();
        runs.push(snapshot());
    }

    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0].iter().filter(|v| v.is_some()).count(), 2);
}

#[test]
fn test_parsed_date_maps_to_written_cell() {
    let root = TempDir::new().unwrap();
    let report = root.path().join("ALPHA.log");
    fs::write(&report, "[2023-05-10]: 4.2\n").unwrap();

    let set = ReportReader::new()
        .read(&report, "ALPHA", ReportFormat::Dated)
        .unwrap();
    let date = NaiveDate::from_ymd_opt(2023, 5, 10).unwrap();
    assert_eq!(set.records, vec![ParsedRecord::dated(date, Reading::Value(4.2))]);

    let mapper = test_config().mapper();
    let unrelated_month = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let coordinate = mapper.coordinate_for(&set.records[0], unrelated_month);
    assert_eq!(coordinate.column, mapper.column_for(date));
    assert_eq!(coordinate.row, mapper.row_for_day(10));
}

#[test]
fn test_derived_output_leaves_source_untouched() {
    let root = TempDir::new().unwrap();
    let workbook = root.path().join("Registos de Produção PV ALPHA.xlsx");
    let report = root.path().join("reports/ALPHA.log");
    create_workbook(&workbook);
    fs::create_dir_all(report.parent().unwrap()).unwrap();
    fs::write(&report, "[2023-05-10]: 4.2\n").unwrap();
    let original = fs::read(&workbook).unwrap();

    let config = SyncConfig {
        output: OutputMode::Derived,
        output_suffix: "uwu".to_string(),
        ..test_config()
    };
    let mappings = StationDiscovery::from_config(&config)
        .unwrap()
        .discover(
            DiscoveryMode::Workbooks,
            &root.path().join("reports"),
            &[PathBuf::from(root.path())],
        )
        .unwrap();

    let mut scheduler = Scheduler::new(&config).unwrap();
    let summary = with_session(|session| scheduler.run(session, &mappings, None)).unwrap();

    assert_eq!(summary.processed, vec!["ALPHA"]);
    assert_eq!(fs::read(&workbook).unwrap(), original);
    let derived = root.path().join("Registos de Produção PV ALPHAuwu.xlsx");
    assert_eq!(cell_number(&derived, 86, 22), Some(4.2));
}

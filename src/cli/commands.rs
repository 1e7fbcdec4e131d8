use crate::cli::args::Cli;
use crate::config::{OutputMode, SyncConfig};
use crate::error::{Result, SyncError};
use crate::models::StationWorkbookMapping;
use crate::processors::{CancellableWait, Scheduler};
use crate::readers::StationDiscovery;
use crate::utils::progress::ProgressReporter;
use crate::workbook::with_session;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use validator::Validate;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let mut config = SyncConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    let discovery = StationDiscovery::from_config(&config)?;
    let mappings = discovery.discover(cli.discovery, &cli.report_dir, &cli.excel_dirs)?;

    if cli.list {
        print_mappings(&mappings, &config);
        return Ok(());
    }

    if mappings.is_empty() {
        println!("No stations found");
        return Ok(());
    }

    let sheet_name = config.resolve_sheet_name()?.to_string();
    let mut scheduler = Scheduler::new(&config)?;
    if config.max_wait_secs > 0 {
        scheduler = scheduler.with_wait(CancellableWait::from_stdin());
        println!("Press Enter to skip the wait before a station");
    }

    println!("Synchronizing {} stations", mappings.len());
    println!("Worksheet: {}", sheet_name);
    println!("Positional reports go to {}", scheduler.target_month().format("%Y-%m"));

    let progress = ProgressReporter::new(mappings.len() as u64, "Synchronizing stations...", cli.quiet);

    let summary = with_session(|session| scheduler.run(session, &mappings, Some(&progress)))?;

    progress.finish_with_message(&format!("Processed {} stations", summary.total()));
    println!("\n{}", summary.summary());

    Ok(())
}

/// CLI flags take precedence over the file and the environment.
pub fn apply_overrides(config: &mut SyncConfig, cli: &Cli) {
    if let Some(month) = &cli.month {
        config.target_month = Some(month.clone());
    }
    if cli.in_place {
        config.output = OutputMode::InPlace;
    }
    if let Some(min_wait) = cli.min_wait {
        config.min_wait_secs = min_wait;
    }
    if let Some(max_wait) = cli.max_wait {
        config.max_wait_secs = max_wait;
    }
}

/// `-v` raises the default level to debug; `RUST_LOG` overrides both.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pv_report_sync={}", level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| SyncError::InvalidFormat(format!("Logging setup failed: {}", e)))
}

fn print_mappings(mappings: &[StationWorkbookMapping], config: &SyncConfig) {
    let output = config.output_policy();
    println!("{} stations discovered", mappings.len());

    for mapping in mappings {
        let report = if mapping.has_report() { "report" } else { "NO REPORT" };
        let workbook = if mapping.has_workbook() { "workbook" } else { "NO WORKBOOK" };
        println!(
            "{:<20} [{} / {}]\n  report:   {}\n  workbook: {}\n  output:   {}",
            mapping.station_id,
            report,
            workbook,
            mapping.report_path.display(),
            mapping.workbook_path.display(),
            output.destination_for(&mapping.workbook_path).display()
        );
    }
}

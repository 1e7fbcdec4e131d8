use crate::readers::DiscoveryMode;
use clap::Parser;
use std::path::PathBuf;

/// Writes each station's production report into its workbook, one addressed
/// cell per reading, leaving everything else in the workbook untouched.
#[derive(Parser, Debug)]
#[command(name = "pv-report-sync")]
#[command(about = "Synchronize PV production reports into station workbooks")]
#[command(version)]
pub struct Cli {
    #[arg(help = "Directory holding the station report files")]
    pub report_dir: PathBuf,

    #[arg(required = true, help = "Spreadsheet root directories")]
    pub excel_dirs: Vec<PathBuf>,

    #[arg(
        short,
        long,
        value_enum,
        default_value = "reports",
        help = "Which directory set lists the stations"
    )]
    pub discovery: DiscoveryMode,

    #[arg(short, long, help = "Configuration file [default: pv-sync.toml if present]")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Month of positional reports, as YYYY-MM [default: current month]")]
    pub month: Option<String>,

    #[arg(long, help = "Overwrite the source workbooks instead of writing derived copies")]
    pub in_place: bool,

    #[arg(long, help = "Minimum wait before each station, in seconds")]
    pub min_wait: Option<u64>,

    #[arg(long, help = "Maximum wait before each station, in seconds")]
    pub max_wait: Option<u64>,

    #[arg(long, help = "List discovered stations and exit without writing")]
    pub list: bool,

    #[arg(short, long, help = "Hide the progress bar")]
    pub quiet: bool,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

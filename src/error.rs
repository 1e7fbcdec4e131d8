use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Report file not found: {}", path.display())]
    MissingReportFile { path: PathBuf },

    #[error("Unable to read report {}: {source}", path.display())]
    ReportReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed date tag in {} at line {line}: '{content}'", path.display())]
    MalformedDateTag {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Worksheet '{sheet}' not found in {}", workbook.display())]
    SheetNotFound { sheet: String, workbook: PathBuf },

    #[error("Unable to open workbook {}: {reason}", path.display())]
    WorkbookOpenFailure { path: PathBuf, reason: String },

    #[error("Workbook {} was opened read-only", path.display())]
    ReadOnlyWorkbook { path: PathBuf },

    #[error("Unable to save workbook to {}: {reason}", path.display())]
    WorkbookSaveFailure { path: PathBuf, reason: String },

    #[error("Spreadsheet session could not start: {0}")]
    SessionFailure(String),

    #[error("Cell (row {row}, column {column}) is outside the sheet bounds (max row {max_row}, max column {max_column})")]
    CellOutOfBounds {
        row: i64,
        column: i64,
        max_row: u32,
        max_column: u32,
    },

    #[error("Conflicting values for cell (row {row}, column {column}) in one report")]
    ConflictingCellValues { row: u32, column: u32 },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl SyncError {
    /// Errors that only invalidate the current station; the batch carries on.
    /// A report that exists but cannot be read stops the whole run.
    pub fn is_station_scoped(&self) -> bool {
        !matches!(
            self,
            SyncError::SessionFailure(_)
                | SyncError::ReportReadFailure { .. }
                | SyncError::Config(_)
                | SyncError::Validation(_)
        )
    }
}

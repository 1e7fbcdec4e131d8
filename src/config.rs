use crate::error::{Result, SyncError};
use crate::models::{Reading, ReportFormat};
use crate::utils::constants::*;
use crate::utils::{derived_output_path, CellMapper};
use crate::workbook::OpenOptions;
use chrono::{Datelike, Local, NaiveDate};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Concrete cell value written for a token that failed numeric coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelPolicy {
    /// Clear the cell.
    Blank,
    /// Write `0`.
    Zero,
}

impl SentinelPolicy {
    /// Concrete cell value for a reading; `None` clears the cell.
    pub fn resolve(&self, reading: Reading) -> Option<f64> {
        match (reading, self) {
            (Reading::Value(value), _) => Some(value),
            (Reading::Sentinel, SentinelPolicy::Blank) => None,
            (Reading::Sentinel, SentinelPolicy::Zero) => Some(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Overwrite the source workbook.
    InPlace,
    /// Write a sibling file named `<stem><output_suffix>.<ext>`.
    Derived,
}

/// Where a written workbook is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPolicy {
    pub mode: OutputMode,
    pub suffix: String,
}

impl OutputPolicy {
    pub fn in_place() -> Self {
        Self {
            mode: OutputMode::InPlace,
            suffix: String::new(),
        }
    }

    pub fn derived(suffix: &str) -> Self {
        Self {
            mode: OutputMode::Derived,
            suffix: suffix.to_string(),
        }
    }

    pub fn destination_for(&self, workbook: &Path) -> PathBuf {
        match self.mode {
            OutputMode::InPlace => workbook.to_path_buf(),
            OutputMode::Derived => derived_output_path(workbook, &self.suffix),
        }
    }
}

/// Everything a sync run needs, resolved once at startup and passed down explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_config"))]
pub struct SyncConfig {
    /// Target worksheet; read from `sheet_name_file` when empty.
    pub sheet_name: String,
    pub sheet_name_file: PathBuf,

    #[validate(range(min = 1900, max = 9999))]
    pub epoch_year: i32,

    #[validate(range(min = 1))]
    pub column_offset: u32,

    pub header_row_offset: u32,

    /// Index given to the first line of a positional report.
    pub positional_index_base: u32,

    pub sentinel: SentinelPolicy,

    pub output: OutputMode,
    pub output_suffix: String,

    #[validate(length(min = 1))]
    pub report_extension: String,

    /// Forces a report layout instead of inferring it from the extension.
    pub report_format: Option<ReportFormat>,

    pub workbook_template: String,
    pub workbook_pattern: String,

    /// `YYYY-MM` that positional reports belong to; the current month when unset.
    pub target_month: Option<String>,

    pub min_wait_secs: u64,
    pub max_wait_secs: u64,

    /// Reject coordinates beyond the sheet's used range, not just the xlsx grid.
    pub strict_bounds: bool,

    pub open: OpenOptions,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sheet_name: String::new(),
            sheet_name_file: PathBuf::from(DEFAULT_SHEET_NAME_FILE),
            epoch_year: DEFAULT_EPOCH_YEAR,
            column_offset: DEFAULT_COLUMN_OFFSET,
            header_row_offset: DEFAULT_HEADER_ROW_OFFSET,
            positional_index_base: DEFAULT_POSITIONAL_INDEX_BASE,
            sentinel: SentinelPolicy::Blank,
            output: OutputMode::Derived,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            report_extension: DEFAULT_REPORT_EXTENSION.to_string(),
            report_format: None,
            workbook_template: DEFAULT_WORKBOOK_TEMPLATE.to_string(),
            workbook_pattern: DEFAULT_WORKBOOK_PATTERN.to_string(),
            target_month: None,
            min_wait_secs: 0,
            max_wait_secs: 0,
            strict_bounds: false,
            open: OpenOptions::default(),
        }
    }
}

fn validate_config(config: &SyncConfig) -> std::result::Result<(), ValidationError> {
    if config.min_wait_secs > config.max_wait_secs {
        return Err(ValidationError::new("min_wait_secs must not exceed max_wait_secs"));
    }
    if config.output == OutputMode::Derived && config.output_suffix.is_empty() {
        return Err(ValidationError::new("derived output needs a non-empty output_suffix"));
    }
    for (name, value) in [
        ("workbook_template", &config.workbook_template),
        ("workbook_pattern", &config.workbook_pattern),
    ] {
        if !value.contains(STATION_PLACEHOLDER) {
            let mut err = ValidationError::new("missing {station} placeholder");
            err.add_param("field".into(), &name);
            return Err(err);
        }
    }
    Ok(())
}

impl SyncConfig {
    /// Layer defaults, an optional TOML file and `PV_SYNC_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let required = path.is_some();

        let settings = Config::builder()
            .add_source(File::from(file).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: SyncConfig = settings.try_deserialize()?;
        config.validate()?;
        tracing::debug!(config = ?config, "configuration loaded");
        Ok(config)
    }

    /// Fill `sheet_name` from the first line of `sheet_name_file` when not set directly.
    pub fn resolve_sheet_name(&mut self) -> Result<&str> {
        if self.sheet_name.trim().is_empty() {
            let content = fs::read_to_string(&self.sheet_name_file).map_err(|e| {
                SyncError::InvalidFormat(format!(
                    "Cannot read sheet name from {}: {}",
                    self.sheet_name_file.display(),
                    e
                ))
            })?;
            let name = content
                .trim_start_matches('\u{feff}')
                .lines()
                .next()
                .map(str::trim)
                .unwrap_or_default();

            if name.is_empty() {
                return Err(SyncError::InvalidFormat(format!(
                    "Sheet name file {} is empty",
                    self.sheet_name_file.display()
                )));
            }
            self.sheet_name = name.to_string();
        }
        Ok(&self.sheet_name)
    }

    pub fn mapper(&self) -> CellMapper {
        CellMapper::new(self.epoch_year, self.column_offset, self.header_row_offset)
    }

    pub fn wait_window(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.min_wait_secs),
            Duration::from_secs(self.max_wait_secs),
        )
    }

    /// First day of the month positional reports are written into.
    pub fn target_month(&self) -> Result<NaiveDate> {
        match &self.target_month {
            Some(month) => Ok(NaiveDate::parse_from_str(
                &format!("{}-01", month.trim()),
                "%Y-%m-%d",
            )?),
            None => {
                let today = Local::now().date_naive();
                Ok(today.with_day(1).unwrap_or(today))
            }
        }
    }

    /// Layout of a report file: configured, or inferred from its extension.
    pub fn report_format_for(&self, report_path: &Path) -> Result<ReportFormat> {
        if let Some(format) = self.report_format {
            return Ok(format);
        }
        report_path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ReportFormat::from_extension)
            .ok_or_else(|| {
                SyncError::InvalidFormat(format!(
                    "Cannot infer report format of {}; set report_format",
                    report_path.display()
                ))
            })
    }

    pub fn output_policy(&self) -> OutputPolicy {
        match self.output {
            OutputMode::InPlace => OutputPolicy::in_place(),
            OutputMode::Derived => OutputPolicy::derived(&self.output_suffix),
        }
    }
}

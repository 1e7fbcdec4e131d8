use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::models::StationWorkbookMapping;
use crate::utils::constants::{OFFICE_LOCK_PREFIX, STATION_PLACEHOLDER, WORKBOOK_EXTENSION};
use crate::utils::fill_station_template;
use clap::ValueEnum;
use glob::{glob, Pattern};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Which directory set is authoritative for the list of stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// Every report file is a station; workbook paths are computed.
    Reports,
    /// Every matching workbook is a station; report paths are computed.
    Workbooks,
}

pub struct StationDiscovery {
    report_extension: String,
    workbook_template: String,
    workbook_pattern: Regex,
}

impl StationDiscovery {
    pub fn new(report_extension: &str, workbook_template: &str, workbook_pattern: &str) -> Result<Self> {
        Ok(Self {
            report_extension: report_extension.trim_start_matches('.').to_string(),
            workbook_template: workbook_template.to_string(),
            workbook_pattern: filename_regex(workbook_pattern)?,
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(
            &config.report_extension,
            &config.workbook_template,
            &config.workbook_pattern,
        )
    }

    pub fn discover(
        &self,
        mode: DiscoveryMode,
        report_dir: &Path,
        excel_dirs: &[PathBuf],
    ) -> Result<Vec<StationWorkbookMapping>> {
        match mode {
            DiscoveryMode::Reports => self.discover_from_reports(report_dir, excel_dirs),
            DiscoveryMode::Workbooks => self.discover_from_workbooks(report_dir, excel_dirs),
        }
    }

    /// One station per report file in `report_dir`; workbooks live under the first excel dir.
    pub fn discover_from_reports(
        &self,
        report_dir: &Path,
        excel_dirs: &[PathBuf],
    ) -> Result<Vec<StationWorkbookMapping>> {
        ensure_dir(report_dir)?;
        let excel_root = excel_dirs.first().ok_or_else(|| {
            SyncError::InvalidFormat("At least one spreadsheet directory is required".to_string())
        })?;

        let pattern = format!("*.{}", self.report_extension);
        let mut seen = HashSet::new();
        let mut mappings = Vec::new();

        for report_path in list_files(report_dir, &pattern)? {
            let Some(station_id) = report_path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !seen.insert(station_id.to_string()) {
                tracing::warn!(station = station_id, path = %report_path.display(), "duplicate station ignored");
                continue;
            }

            let workbook_path =
                excel_root.join(fill_station_template(&self.workbook_template, station_id));
            mappings.push(StationWorkbookMapping::new(
                station_id.to_string(),
                report_path,
                workbook_path,
            ));
        }

        tracing::info!(stations = mappings.len(), dir = %report_dir.display(), "stations discovered from reports");
        Ok(mappings)
    }

    /// One station per matching workbook found recursively under the excel dirs, in order.
    /// The first workbook found for a station wins.
    pub fn discover_from_workbooks(
        &self,
        report_dir: &Path,
        excel_dirs: &[PathBuf],
    ) -> Result<Vec<StationWorkbookMapping>> {
        let pattern = format!("**/*.{}", WORKBOOK_EXTENSION);
        let mut seen = HashSet::new();
        let mut mappings = Vec::new();

        for excel_dir in excel_dirs {
            ensure_dir(excel_dir)?;

            for workbook_path in list_files(excel_dir, &pattern)? {
                let Some(station_id) = self.station_from_workbook(&workbook_path) else {
                    tracing::trace!(path = %workbook_path.display(), "workbook does not match naming pattern");
                    continue;
                };
                if !seen.insert(station_id.clone()) {
                    tracing::warn!(station = %station_id, path = %workbook_path.display(), "duplicate station ignored");
                    continue;
                }

                let report_path =
                    report_dir.join(format!("{}.{}", station_id, self.report_extension));
                mappings.push(StationWorkbookMapping::new(
                    station_id,
                    report_path,
                    workbook_path,
                ));
            }
        }

        tracing::info!(stations = mappings.len(), "stations discovered from workbooks");
        Ok(mappings)
    }

    /// Station id embedded in a workbook's file name, if it follows the naming pattern.
    pub fn station_from_workbook(&self, path: &Path) -> Option<String> {
        let filename = path.file_name()?.to_str()?;
        if filename.starts_with(OFFICE_LOCK_PREFIX) {
            return None;
        }

        let captures = self.workbook_pattern.captures(filename)?;
        let station = captures.name("station")?.as_str().trim();
        if station.is_empty() {
            None
        } else {
            Some(station.to_string())
        }
    }
}

/// Turn `Registos de Produção PV {station}.xlsx` into an anchored regex capturing the station.
fn filename_regex(template: &str) -> Result<Regex> {
    let mut parts = template.split(STATION_PLACEHOLDER);
    let mut expr = String::from("^");
    expr.push_str(&regex::escape(parts.next().unwrap_or_default()));

    let mut captured = false;
    for part in parts {
        if captured {
            expr.push_str(".+?");
        } else {
            expr.push_str("(?P<station>.+?)");
            captured = true;
        }
        expr.push_str(&regex::escape(part));
    }
    expr.push('$');

    if !captured {
        return Err(SyncError::InvalidFormat(format!(
            "Workbook pattern '{}' has no {} placeholder",
            template, STATION_PLACEHOLDER
        )));
    }

    Regex::new(&expr).map_err(|e| SyncError::InvalidFormat(format!("Invalid workbook pattern: {}", e)))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(SyncError::InvalidFormat(format!(
            "Not a directory: {}",
            dir.display()
        )))
    }
}

/// Files under `dir` matching a glob pattern, sorted for a stable discovery order.
fn list_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = format!("{}/{}", Pattern::escape(&dir.to_string_lossy()), pattern);
    let entries = glob(&full)
        .map_err(|e| SyncError::InvalidFormat(format!("Invalid glob pattern '{}': {}", full, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SyncError::Io(e.into_error()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

use crate::config::{OutputPolicy, SentinelPolicy, SyncConfig};
use crate::error::{Result, SyncError};
use crate::models::{RecordKey, StationRecordSet};
use crate::utils::constants::{MAX_SHEET_COLUMNS, MAX_SHEET_ROWS};
use crate::utils::{CellCoordinate, CellMapper};
use crate::workbook::WorkbookHandle;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::PathBuf;
use umya_spreadsheet::Worksheet;

#[derive(Debug, Clone, PartialEq)]
pub struct WriteSummary {
    pub cells_written: usize,
    pub cells_cleared: usize,
    pub destination: PathBuf,
}

/// A planned write: 1-based `(column, row)` and the value, `None` clearing the cell.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CellWrite {
    column: u32,
    row: u32,
    value: Option<f64>,
}

/// Writes a station's records into the configured worksheet, one addressed cell each.
pub struct SheetWriter {
    sheet_name: String,
    mapper: CellMapper,
    sentinel: SentinelPolicy,
    output: OutputPolicy,
    strict_bounds: bool,
}

impl SheetWriter {
    pub fn new(sheet_name: &str, mapper: CellMapper) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            mapper,
            sentinel: SentinelPolicy::Blank,
            output: OutputPolicy::in_place(),
            strict_bounds: false,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            sheet_name: config.sheet_name.clone(),
            mapper: config.mapper(),
            sentinel: config.sentinel,
            output: config.output_policy(),
            strict_bounds: config.strict_bounds,
        }
    }

    pub fn with_sentinel(mut self, sentinel: SentinelPolicy) -> Self {
        self.sentinel = sentinel;
        self
    }

    pub fn with_output(mut self, output: OutputPolicy) -> Self {
        self.output = output;
        self
    }

    pub fn with_strict_bounds(mut self, strict_bounds: bool) -> Self {
        self.strict_bounds = strict_bounds;
        self
    }

    /// Apply the records to the open workbook and persist it under the output policy.
    /// `month` is the column for positional records.
    pub fn write(
        &self,
        handle: &mut WorkbookHandle<'_>,
        records: &StationRecordSet,
        month: NaiveDate,
    ) -> Result<WriteSummary> {
        let (cells_written, cells_cleared) = self.apply(handle, records, month)?;

        let destination = self.output.destination_for(handle.path());
        let destination = handle.save_as(destination)?;

        tracing::info!(
            station = %records.station_id,
            cells = cells_written,
            destination = %destination.display(),
            "workbook updated"
        );

        Ok(WriteSummary {
            cells_written,
            cells_cleared,
            destination,
        })
    }

    /// Set the addressed cells in memory. Every coordinate is checked before any
    /// cell is touched, so a failure leaves the sheet unchanged.
    pub fn apply(
        &self,
        handle: &mut WorkbookHandle<'_>,
        records: &StationRecordSet,
        month: NaiveDate,
    ) -> Result<(usize, usize)> {
        let worksheet = handle.worksheet_mut(&self.sheet_name)?;
        let (max_column, max_row) = self.limits(worksheet);
        let plan = self.plan(records, month, max_column, max_row)?;

        let mut cleared = 0;
        if records.format.is_dated() {
            for write in &plan {
                cleared += usize::from(set_cell(worksheet, write));
            }
        } else {
            cleared = write_column_range(worksheet, &plan);
        }

        Ok((plan.len() - cleared, cleared))
    }

    fn limits(&self, worksheet: &Worksheet) -> (u32, u32) {
        if self.strict_bounds {
            worksheet.get_highest_column_and_row()
        } else {
            (MAX_SHEET_COLUMNS, MAX_SHEET_ROWS)
        }
    }

    fn plan(
        &self,
        records: &StationRecordSet,
        month: NaiveDate,
        max_column: u32,
        max_row: u32,
    ) -> Result<Vec<CellWrite>> {
        let mut plan = Vec::with_capacity(records.len());
        let mut planned: HashMap<(u32, u32), Option<f64>> = HashMap::new();

        for record in &records.records {
            let coordinate = self.mapper.coordinate_for(record, month);
            let (column, row) = checked(coordinate, max_column, max_row)?;
            let value = self.sentinel.resolve(record.value);

            match planned.get(&(column, row)) {
                Some(existing) if *existing == value => continue,
                Some(_) => return Err(SyncError::ConflictingCellValues { row, column }),
                None => {
                    planned.insert((column, row), value);
                    plan.push(CellWrite { column, row, value });
                }
            }
        }

        if !records.format.is_dated() {
            ensure_contiguous(records, &plan)?;
        }
        Ok(plan)
    }
}

fn checked(coordinate: CellCoordinate, max_column: u32, max_row: u32) -> Result<(u32, u32)> {
    let in_range = |value: i64, max: u32| value >= 1 && value <= max as i64;

    if in_range(coordinate.column, max_column) && in_range(coordinate.row, max_row) {
        Ok((coordinate.column as u32, coordinate.row as u32))
    } else {
        Err(SyncError::CellOutOfBounds {
            row: coordinate.row,
            column: coordinate.column,
            max_row,
            max_column,
        })
    }
}

/// Positional reports are a full-month refresh: one column, no gaps.
fn ensure_contiguous(records: &StationRecordSet, plan: &[CellWrite]) -> Result<()> {
    let gap = plan
        .windows(2)
        .any(|pair| pair[0].column != pair[1].column || pair[1].row != pair[0].row + 1);
    let keyed_by_date = records
        .records
        .iter()
        .any(|r| matches!(r.key, RecordKey::Date(_)));

    if gap || keyed_by_date {
        return Err(SyncError::InvalidFormat(format!(
            "Positional report for station {} does not form a contiguous range",
            records.station_id
        )));
    }
    Ok(())
}

/// Returns true when the cell was cleared rather than given a number.
fn set_cell(worksheet: &mut Worksheet, write: &CellWrite) -> bool {
    match write.value {
        Some(value) => {
            worksheet
                .get_cell_mut((write.column, write.row))
                .set_value_number(value);
            false
        }
        None => {
            // Never create a cell just to leave it empty
            if worksheet.get_cell((write.column, write.row)).is_some() {
                worksheet
                    .get_cell_mut((write.column, write.row))
                    .set_value("");
            }
            true
        }
    }
}

/// Write a contiguous column range top to bottom, returning the number of cleared cells.
fn write_column_range(worksheet: &mut Worksheet, range: &[CellWrite]) -> usize {
    if let (Some(first), Some(last)) = (range.first(), range.last()) {
        tracing::debug!(
            column = first.column,
            first_row = first.row,
            last_row = last.row,
            "writing column range"
        );
    }
    range
        .iter()
        .map(|write| usize::from(set_cell(worksheet, write)))
        .sum()
}

use crate::models::{ParsedRecord, RecordKey};
use crate::utils::constants::{
    COLUMNS_PER_MONTH, DEFAULT_COLUMN_OFFSET, DEFAULT_EPOCH_YEAR, DEFAULT_HEADER_ROW_OFFSET,
    MONTHS_PER_YEAR,
};
use chrono::{Datelike, NaiveDate};

/// A 1-based sheet address. Not bounds-checked; see `SheetWriter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoordinate {
    pub row: i64,
    pub column: i64,
}

impl CellCoordinate {
    pub fn new(row: i64, column: i64) -> Self {
        Self { row, column }
    }
}

/// Maps dates and report positions onto the month-per-three-columns sheet layout.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use pv_report_sync::utils::CellMapper;
///
/// let mapper = CellMapper::new(2021, 2, 12);
/// let date = NaiveDate::from_ymd_opt(2022, 1, 5).unwrap();
/// assert_eq!(mapper.column_for(date), 38);
/// assert_eq!(mapper.row_for_day(5), 17);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMapper {
    epoch_year: i32,
    column_offset: u32,
    header_row_offset: u32,
}

impl CellMapper {
    pub fn new(epoch_year: i32, column_offset: u32, header_row_offset: u32) -> Self {
        Self {
            epoch_year,
            column_offset,
            header_row_offset,
        }
    }

    /// Months elapsed since January of the epoch year (negative before it).
    pub fn month_index(&self, date: NaiveDate) -> i64 {
        (date.year() as i64 - self.epoch_year as i64) * MONTHS_PER_YEAR + date.month0() as i64
    }

    pub fn column_for(&self, date: NaiveDate) -> i64 {
        self.month_index(date) * COLUMNS_PER_MONTH + self.column_offset as i64
    }

    pub fn row_for_day(&self, day: u32) -> i64 {
        self.header_row_offset as i64 + day as i64
    }

    pub fn row_for_index(&self, index: u32) -> i64 {
        self.header_row_offset as i64 + index as i64
    }

    /// Dated records carry their own month; positional ones land in `month`.
    pub fn coordinate_for(&self, record: &ParsedRecord, month: NaiveDate) -> CellCoordinate {
        match record.key {
            RecordKey::Date(date) => {
                CellCoordinate::new(self.row_for_day(date.day()), self.column_for(date))
            }
            RecordKey::Index(index) => {
                CellCoordinate::new(self.row_for_index(index), self.column_for(month))
            }
        }
    }
}

impl Default for CellMapper {
    fn default() -> Self {
        Self::new(
            DEFAULT_EPOCH_YEAR,
            DEFAULT_COLUMN_OFFSET,
            DEFAULT_HEADER_ROW_OFFSET,
        )
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Layout of a station report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// One raw value per line, the day implied by the line position.
    Positional,
    /// `[YYYY-MM-DD]: <value>` per line.
    Dated,
    /// `YYYY-MM-DD; <value>` per line.
    DatedCsv,
}

impl ReportFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "txt" => Some(ReportFormat::Positional),
            "log" => Some(ReportFormat::Dated),
            "csv" => Some(ReportFormat::DatedCsv),
            _ => None,
        }
    }

    pub fn is_dated(&self) -> bool {
        matches!(self, ReportFormat::Dated | ReportFormat::DatedCsv)
    }
}

/// A numeric reading, or the sentinel standing in for a token that did not parse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    Sentinel,
}

impl Reading {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Reading::Sentinel)
    }
}

/// What addresses a record in the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey {
    Date(NaiveDate),
    Index(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub key: RecordKey,
    pub value: Reading,
}

impl ParsedRecord {
    pub fn dated(date: NaiveDate, value: Reading) -> Self {
        Self {
            key: RecordKey::Date(date),
            value,
        }
    }

    pub fn positional(index: u32, value: Reading) -> Self {
        Self {
            key: RecordKey::Index(index),
            value,
        }
    }
}

/// One station's parsed report, read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecordSet {
    pub station_id: String,
    pub format: ReportFormat,
    pub records: Vec<ParsedRecord>,
}

impl StationRecordSet {
    pub fn new(station_id: String, format: ReportFormat, records: Vec<ParsedRecord>) -> Self {
        Self {
            station_id,
            format,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sentinel_count(&self) -> usize {
        self.records.iter().filter(|r| r.value.is_sentinel()).count()
    }
}

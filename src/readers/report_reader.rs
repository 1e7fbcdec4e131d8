use crate::error::{Result, SyncError};
use crate::models::{ParsedRecord, Reading, ReportFormat, StationRecordSet};
use crate::utils::constants::DEFAULT_POSITIONAL_INDEX_BASE;
use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn dated_tag() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"^\[(\d{4}-\d{2}-\d{2})\]:\s*(.*?)\s*$").expect("valid dated report pattern")
    })
}

fn csv_tag() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})\s*;\s*(.*?)\s*$").expect("valid csv report pattern")
    })
}

/// Coerce a report token into a reading. Never fails: anything that is not a
/// finite float becomes the sentinel.
pub fn to_numeric(token: &str) -> Reading {
    match token.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Reading::Value(value),
        _ => Reading::Sentinel,
    }
}

pub struct ReportReader {
    index_base: u32,
}

impl ReportReader {
    pub fn new() -> Self {
        Self {
            index_base: DEFAULT_POSITIONAL_INDEX_BASE,
        }
    }

    /// Index assigned to the first line of a positional report.
    pub fn with_index_base(index_base: u32) -> Self {
        Self { index_base }
    }

    /// Read and fully parse a report. The first malformed line aborts the whole file.
    pub fn read(
        &self,
        path: &Path,
        station_id: &str,
        format: ReportFormat,
    ) -> Result<StationRecordSet> {
        let records = self.open(path, format)?.collect::<Result<Vec<_>>>()?;

        let set = StationRecordSet::new(station_id.to_string(), format, records);
        tracing::debug!(
            station = station_id,
            records = set.len(),
            sentinels = set.sentinel_count(),
            "report parsed"
        );
        Ok(set)
    }

    /// Open a report as a lazy sequence of per-line results. Reopen to restart.
    pub fn open(&self, path: &Path, format: ReportFormat) -> Result<ReportLines> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SyncError::MissingReportFile {
                path: path.to_path_buf(),
            },
            _ => SyncError::ReportReadFailure {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let (content, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
        if had_errors {
            return Err(SyncError::InvalidFormat(format!(
                "Invalid UTF-8 in report {}",
                path.display()
            )));
        }

        Ok(ReportLines {
            path: path.to_path_buf(),
            format,
            content: content.into_owned(),
            cursor: 0,
            line_count: 0,
            index_base: self.index_base,
            failed: false,
        })
    }
}

impl Default for ReportReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the records of one report, fused after the first error.
pub struct ReportLines {
    path: PathBuf,
    format: ReportFormat,
    content: String,
    cursor: usize,
    line_count: usize,
    index_base: u32,
    failed: bool,
}

impl ReportLines {
    fn next_line(&mut self) -> Option<String> {
        if self.cursor >= self.content.len() {
            return None;
        }

        let rest = &self.content[self.cursor..];
        let (line, advance) = match rest.find('\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        let line = line.trim_end().to_string();

        self.cursor += advance;
        self.line_count += 1;
        Some(line)
    }

    fn parse_tagged(&self, line: &str) -> Option<ParsedRecord> {
        let pattern = match self.format {
            ReportFormat::DatedCsv => csv_tag(),
            _ => dated_tag(),
        };
        let captures = pattern.captures(line)?;
        let date = NaiveDate::parse_from_str(&captures[1], "%Y-%m-%d").ok()?;
        Some(ParsedRecord::dated(date, to_numeric(&captures[2])))
    }
}

impl Iterator for ReportLines {
    type Item = Result<ParsedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let line = self.next_line()?;

            if self.format == ReportFormat::Positional {
                // Blank lines still occupy their day
                let index = self.index_base + (self.line_count - 1) as u32;
                return Some(Ok(ParsedRecord::positional(index, to_numeric(&line))));
            }

            if line.trim().is_empty() {
                continue;
            }

            return match self.parse_tagged(&line) {
                Some(record) => Some(Ok(record)),
                None => {
                    self.failed = true;
                    Some(Err(SyncError::MalformedDateTag {
                        path: self.path.clone(),
                        line: self.line_count,
                        content: line,
                    }))
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKey;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn report(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_to_numeric() {
        assert_eq!(to_numeric("12.3"), Reading::Value(12.3));
        assert_eq!(to_numeric(" 7 "), Reading::Value(7.0));
        assert_eq!(to_numeric("-0.5"), Reading::Value(-0.5));
        assert_eq!(to_numeric("abc"), Reading::Sentinel);
        assert_eq!(to_numeric(""), Reading::Sentinel);
        assert_eq!(to_numeric("12,3"), Reading::Sentinel);
        assert_eq!(to_numeric("NaN"), Reading::Sentinel);
        assert_eq!(to_numeric("inf"), Reading::Sentinel);
    }

    #[test]
    fn test_read_dated_report() -> Result<()> {
        let file = report(&["[2023-05-10]: 4.2", "[2023-05-11]: n/a", "", "[2023-05-12]: 0"]);
        let set = ReportReader::new().read(file.path(), "ALPHA", ReportFormat::Dated)?;

        assert_eq!(set.station_id, "ALPHA");
        assert_eq!(
            set.records,
            vec![
                ParsedRecord::dated(date(2023, 5, 10), Reading::Value(4.2)),
                ParsedRecord::dated(date(2023, 5, 11), Reading::Sentinel),
                ParsedRecord::dated(date(2023, 5, 12), Reading::Value(0.0)),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_malformed_tag_aborts_file() -> Result<()> {
        let file = report(&["[2023-05-10]: 4.2", "2023-05-11: 3.0", "[2023-05-12]: 1.0"]);
        let err = ReportReader::new()
            .read(file.path(), "ALPHA", ReportFormat::Dated)
            .unwrap_err();

        match err {
            SyncError::MalformedDateTag { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, "2023-05-11: 3.0");
            }
            other => panic!("unexpected error: {}", other),
        }
        Ok(())
    }

    #[test]
    fn test_iterator_is_fused_after_error() -> Result<()> {
        let file = report(&["[2023-02-30]: 1.0", "[2023-03-01]: 2.0"]);
        let mut lines = ReportReader::new().open(file.path(), ReportFormat::Dated)?;

        assert!(matches!(lines.next(), Some(Err(SyncError::MalformedDateTag { .. }))));
        assert!(lines.next().is_none());
        Ok(())
    }

    #[test]
    fn test_reopen_restarts_sequence() -> Result<()> {
        let file = report(&["1.5", "2.5"]);
        let reader = ReportReader::new();

        let first: Vec<_> = reader.open(file.path(), ReportFormat::Positional)?.take(1).collect();
        let second: Vec<_> = reader.open(file.path(), ReportFormat::Positional)?.collect();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        Ok(())
    }

    #[test]
    fn test_read_positional_report() -> Result<()> {
        let file = report(&["1.5  ", "", "oops", "3"]);
        let set = ReportReader::new().read(file.path(), "BETA", ReportFormat::Positional)?;

        assert_eq!(
            set.records,
            vec![
                ParsedRecord::positional(1, Reading::Value(1.5)),
                ParsedRecord::positional(2, Reading::Sentinel),
                ParsedRecord::positional(3, Reading::Sentinel),
                ParsedRecord::positional(4, Reading::Value(3.0)),
            ]
        );
        assert_eq!(set.sentinel_count(), 2);
        Ok(())
    }

    #[test]
    fn test_positional_zero_based() -> Result<()> {
        let file = report(&["10", "20"]);
        let set =
            ReportReader::with_index_base(0).read(file.path(), "BETA", ReportFormat::Positional)?;
        assert_eq!(set.records[0].key, RecordKey::Index(0));
        assert_eq!(set.records[1].key, RecordKey::Index(1));
        Ok(())
    }

    #[test]
    fn test_read_csv_report_with_bom_and_crlf() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"\xEF\xBB\xBF2023-05-10; 4.2\r\n2023-05-11;0\r\n")?;

        let set = ReportReader::new().read(file.path(), "GAMMA", ReportFormat::DatedCsv)?;
        assert_eq!(
            set.records,
            vec![
                ParsedRecord::dated(date(2023, 5, 10), Reading::Value(4.2)),
                ParsedRecord::dated(date(2023, 5, 11), Reading::Value(0.0)),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_missing_report_file() -> Result<()> {
        let dir = TempDir::new()?;
        let err = ReportReader::new()
            .read(&dir.path().join("ALPHA.log"), "ALPHA", ReportFormat::Dated)
            .unwrap_err();
        assert!(matches!(err, SyncError::MissingReportFile { .. }));
        Ok(())
    }

    #[test]
    fn test_unreadable_report_is_not_missing() -> Result<()> {
        let dir = TempDir::new()?;
        let report = dir.path().join("ALPHA.log");
        fs::create_dir(&report)?;

        let err = ReportReader::new()
            .read(&report, "ALPHA", ReportFormat::Dated)
            .unwrap_err();
        assert!(matches!(err, SyncError::ReportReadFailure { .. }));
        assert!(!err.is_station_scoped());
        Ok(())
    }

    #[test]
    fn test_invalid_utf8() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"[2023-05-10]: \xff\xfe\n")?;
        let err = ReportReader::new()
            .read(file.path(), "ALPHA", ReportFormat::Dated)
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidFormat(_)));
        Ok(())
    }
}

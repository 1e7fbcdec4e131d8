pub mod record;
pub mod station;

pub use record::{ParsedRecord, Reading, RecordKey, ReportFormat, StationRecordSet};
pub use station::StationWorkbookMapping;

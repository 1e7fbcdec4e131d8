use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Where one station's report comes from and which workbook it lands in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StationWorkbookMapping {
    #[validate(length(min = 1))]
    pub station_id: String,

    pub report_path: PathBuf,

    pub workbook_path: PathBuf,
}

impl StationWorkbookMapping {
    pub fn new(station_id: String, report_path: PathBuf, workbook_path: PathBuf) -> Self {
        Self {
            station_id,
            report_path,
            workbook_path,
        }
    }

    pub fn has_report(&self) -> bool {
        self.report_path.is_file()
    }

    pub fn has_workbook(&self) -> bool {
        self.workbook_path.is_file()
    }
}

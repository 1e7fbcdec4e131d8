pub mod report_reader;
pub mod station_discovery;

pub use report_reader::{to_numeric, ReportLines, ReportReader};
pub use station_discovery::{DiscoveryMode, StationDiscovery};

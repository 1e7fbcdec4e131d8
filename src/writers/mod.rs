pub mod sheet_writer;

pub use sheet_writer::{SheetWriter, WriteSummary};

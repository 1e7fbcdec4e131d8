pub mod session;

pub use session::{with_session, OpenOptions, WorkbookHandle, WorkbookSession};

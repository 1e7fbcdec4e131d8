pub mod pacing;
pub mod scheduler;

pub use pacing::{CancellableWait, Pacing, WaitOutcome};
pub use scheduler::{RunSummary, Scheduler};

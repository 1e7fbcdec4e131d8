pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use coordinates::{CellCoordinate, CellMapper};
pub use filename::{derived_output_path, fill_station_template};
pub use progress::ProgressReporter;

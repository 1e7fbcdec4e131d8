use crate::utils::constants::STATION_PLACEHOLDER;
use std::path::{Path, PathBuf};

/// Sibling path carrying `suffix` after the stem: `dir/book.xlsx` -> `dir/book_sync.xlsx`
pub fn derived_output_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let filename = match source.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    source.with_file_name(filename)
}

/// Substitute every `{station}` placeholder in a naming template
pub fn fill_station_template(template: &str, station_id: &str) -> String {
    template.replace(STATION_PLACEHOLDER, station_id)
}

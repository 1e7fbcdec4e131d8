/// Sheet layout defaults
pub const DEFAULT_EPOCH_YEAR: i32 = 2021;
pub const DEFAULT_COLUMN_OFFSET: u32 = 2;
pub const DEFAULT_HEADER_ROW_OFFSET: u32 = 12;
pub const DEFAULT_POSITIONAL_INDEX_BASE: u32 = 1;

/// Columns reserved per month, one per series
pub const COLUMNS_PER_MONTH: i64 = 3;
pub const MONTHS_PER_YEAR: i64 = 12;

/// xlsx grid limits
pub const MAX_SHEET_ROWS: u32 = 1_048_576;
pub const MAX_SHEET_COLUMNS: u32 = 16_384;

/// File names and naming conventions
pub const DEFAULT_CONFIG_FILE: &str = "pv-sync.toml";
pub const DEFAULT_SHEET_NAME_FILE: &str = "sheet_name.secret.txt";
pub const DEFAULT_REPORT_EXTENSION: &str = "log";
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_sync";
pub const WORKBOOK_EXTENSION: &str = "xlsx";
pub const STATION_PLACEHOLDER: &str = "{station}";
pub const DEFAULT_WORKBOOK_TEMPLATE: &str = "{station}/Registos_de_Producao_PV_{station}.xlsx";
pub const DEFAULT_WORKBOOK_PATTERN: &str = "Registos de Produção PV {station}.xlsx";
pub const OFFICE_LOCK_PREFIX: &str = "~$";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "PV_SYNC";

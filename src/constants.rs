//! Column names of the collected-store CSV export.
//! The upstream collector writes Korean headers, so these must match byte for byte.

// Required columns
pub const COL_NAME: &str = "이름";
pub const COL_ADDRESS: &str = "주소";
pub const COL_SOURCE: &str = "출처";
pub const COL_MATCH_REASON: &str = "매칭이유";

// Derived columns (read if present, appended otherwise)
pub const COL_NORMALIZED_ADDRESS: &str = "주소_정규화";
pub const COL_NORMALIZED_NAME: &str = "이름_정규화";

// Optional columns written by the closure-detection pass
pub const COL_STATUS: &str = "상태";
pub const COL_LATITUDE: &str = "위도";
pub const COL_LONGITUDE: &str = "경도";

pub const REQUIRED_COLUMNS: [&str; 4] = [COL_NAME, COL_ADDRESS, COL_SOURCE, COL_MATCH_REASON];

// Address canonicalization
pub const CITY_SHORT: &str = "서울";
/// Replaced in this order; "서울특별시" must go first since it does not contain "서울시".
pub const CITY_LONG_FORMS: [&str; 2] = ["서울특별시", "서울시"];
pub const DEFAULT_DISTRICT: &str = "영등포구";

// Match reasons and closure statuses
pub const SECONDARY_VERIFICATION_REASON: &str = "2차검증";
pub const STATUS_OPEN: &str = "정상";
pub const STATUS_CLOSED: &str = "폐업";

// Seoul bounding box (WGS84)
pub const SEOUL_LAT_MIN: f64 = 37.4;
pub const SEOUL_LAT_MAX: f64 = 37.7;
pub const SEOUL_LNG_MIN: f64 = 126.7;
pub const SEOUL_LNG_MAX: f64 = 127.2;

// Default artifact locations
pub const DEFAULT_INPUT_PATH: &str = "matched_stores.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "matched_stores_unique.csv";
pub const DEFAULT_CONFIG_PATH: &str = "store_dedup.toml";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE_PREFIX: &str = "store_dedup.log";

pub const UTF8_BOM: &str = "\u{feff}";

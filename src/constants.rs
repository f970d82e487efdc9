//! Default header names and survey constants.

/// Default name of the postcode column in survey CSV files
pub const POSTCODE_CSV_HEADER: &str = "postcode";

/// Number of connection categories (average, slow, BB, SFBB, UFBB)
pub const CATEGORY_COUNT: usize = 5;

/// Default download-speed column names, indexed by connection category
pub const DEFAULT_DOWNLOAD_CSV_HEADERS: [&str; CATEGORY_COUNT] = [
    "Average download speed (Mbit/s)",
    "Average download speed (Mbit/s) for lines  < 10Mbit/s",
    "Average download speed (Mbit/s) for Basic BB lines",
    "Average download speed (Mbit/s) for SFBB lines",
    "Average download speed (Mbit/s) for UFBB lines",
];

/// Default upload-speed column names, indexed by connection category
pub const DEFAULT_UPLOAD_CSV_HEADERS: [&str; CATEGORY_COUNT] = [
    "Average upload speed (Mbit/s)",
    "Average upload speed (Mbit/s) for lines <10Mbit/s",
    "Average upload speed (Mbit/s) for Basic BB lines",
    "Average upload speed (Mbit/s) for SFBB lines",
    "Average upload speed (Mbit/s) for UFBB lines",
];

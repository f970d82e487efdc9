//! Postcode Speeds Library
//!
//! A Rust library for loading yearly UK broadband speed survey data from
//! CSV files into a dimensional SQLite schema, and for querying the most
//! recent speed averages for a given postcode.
//!
//! This library provides tools for:
//! - Parsing and normalizing UK postcodes into area/district/sector/unit
//! - Ingesting survey CSV files one transaction per file, with stale-row
//!   replacement keyed by (category, year, area)
//! - Maintaining an in-memory cache over the postcode dimension tables
//! - Serving per-postcode, per-connection-category averages

pub mod cache;
pub mod category;
pub mod config;
pub mod constants;
pub mod ingest;
pub mod postcode;
pub mod query;
pub mod store;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use cache::DimensionCache;
pub use category::Category;
pub use config::Settings;
pub use postcode::Postcode;
pub use store::Store;

/// Result type alias for postcode-speeds operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ingestion and query operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV reading error
    #[error("CSV error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Underlying storage failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Bad header override, unknown category index, duplicate target
    /// headers, unreadable settings, and similar pre-flight failures
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Target year did not parse as a four digit year
    #[error("Invalid year '{value}'")]
    InvalidYear { value: String },

    /// Configured CSV headers absent from a file's header row
    #[error("Missing csv headers {headers} in '{file}'")]
    MissingHeaders { file: String, headers: String },

    /// Postcode that does not match the UK postcode shape (query side)
    #[error("Invalid postcode '{postcode}'")]
    InvalidPostcode { postcode: String },

    /// Unparsable postcode encountered while ingesting a file
    #[error("Invalid postcode '{postcode}' in file '{file}' at row {row}")]
    InvalidRowPostcode {
        postcode: String,
        file: String,
        row: usize,
    },

    /// A data row whose postcode area differs from the file's first row
    #[error(
        "Invalid postcode area in file '{file}' at row {row}: found '{found}', expected '{expected}'"
    )]
    AreaMismatch {
        file: String,
        row: usize,
        expected: String,
        found: String,
    },

    /// Unknown connection category name on the query side
    #[error("Invalid connection '{name}'")]
    InvalidConnection { name: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid year error
    pub fn invalid_year(value: impl Into<String>) -> Self {
        Self::InvalidYear {
            value: value.into(),
        }
    }

    /// Create an invalid postcode error (query side)
    pub fn invalid_postcode(postcode: impl Into<String>) -> Self {
        Self::InvalidPostcode {
            postcode: postcode.into(),
        }
    }

    /// Create an invalid connection error
    pub fn invalid_connection(name: impl Into<String>) -> Self {
        Self::InvalidConnection { name: name.into() }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

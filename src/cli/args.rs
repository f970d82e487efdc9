//! Command-line argument definitions.
//!
//! Defines the CLI interface using the clap derive API: an `update`
//! subcommand running the ingestion job and an `average` subcommand
//! querying stored averages.

use crate::{Error, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the postcode speeds tool
///
/// Loads UK broadband speed survey CSV files into a dimensional SQLite
/// schema and serves per-postcode speed averages.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "postcode-speeds",
    version,
    about = "Load UK broadband speed survey CSVs and query per-postcode averages"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Load a directory of survey CSV files for one year into the database
    Update(UpdateArgs),
    /// Query the stored averages for a postcode
    Average(AverageArgs),
}

/// Arguments for the update command (ingestion job)
#[derive(Debug, Clone, Parser)]
pub struct UpdateArgs {
    /// Path to the TOML settings file naming the database
    pub settings: PathBuf,

    /// Survey year the files cover, as a four digit year
    pub year: String,

    /// Directory scanned non-recursively for *.csv files
    pub csv_dir: PathBuf,

    /// Postcode column header name
    #[arg(
        long = "postcode-header",
        value_name = "HEADER",
        help = "Postcode column header name (defaults to 'postcode')"
    )]
    pub postcode_header: Option<String>,

    /// Indexed download header override, repeatable
    ///
    /// Each override has the form `<category-index>:<header-name>` with
    /// category-index between 0 and 4, replacing that category's default
    /// download column name.
    #[arg(
        short = 'd',
        long = "down-header",
        value_name = "INDEX:HEADER",
        help = "Indexed download header override (repeatable)"
    )]
    pub down_headers: Vec<String>,

    /// Indexed upload header override, repeatable
    #[arg(
        short = 'u',
        long = "up-header",
        value_name = "INDEX:HEADER",
        help = "Indexed upload header override (repeatable)"
    )]
    pub up_headers: Vec<String>,

    /// Perform all validation and computation but commit nothing
    #[arg(
        short = 'n',
        long = "dry-run",
        help = "Show what would change without storing anything"
    )]
    pub dry_run: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: debug, -vv: trace)"
    )]
    pub verbose: u8,
}

/// Arguments for the average command (query path)
#[derive(Debug, Clone, Parser)]
pub struct AverageArgs {
    /// Path to the TOML settings file naming the database
    pub settings: PathBuf,

    /// Postcode to look up
    pub postcode: String,

    /// Connection category to filter by ('all' selects every category)
    #[arg(
        short = 'c',
        long = "connection",
        value_name = "NAME",
        default_value = "average",
        help = "Connection category: average, slow, BB, SFBB, UFBB or all"
    )]
    pub connection: String,

    /// Report invalid input as a message instead of an error
    #[arg(
        long = "lenient",
        help = "Report invalid postcode/connection as a message, not an error"
    )]
    pub lenient: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: debug, -vv: trace)"
    )]
    pub verbose: u8,
}

impl UpdateArgs {
    /// Validate path arguments before any work starts
    pub fn validate(&self) -> Result<()> {
        if !self.settings.exists() {
            return Err(Error::configuration(format!(
                "Settings file does not exist: {}",
                self.settings.display()
            )));
        }

        if !self.csv_dir.is_dir() {
            return Err(Error::configuration(format!(
                "CSV path is not a directory: {}",
                self.csv_dir.display()
            )));
        }

        Ok(())
    }

    /// Determine the log level from the verbosity flag
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose)
    }
}

impl AverageArgs {
    /// Determine the log level from the verbosity flag
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose)
    }
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_update_args_validation() {
        let temp_dir = TempDir::new().unwrap();
        let settings = temp_dir.path().join("settings.toml");
        std::fs::write(&settings, "[database]\npath = \"speeds.db\"\n").unwrap();

        let args = UpdateArgs {
            settings: settings.clone(),
            year: "2020".to_string(),
            csv_dir: temp_dir.path().to_path_buf(),
            postcode_header: None,
            down_headers: vec![],
            up_headers: vec![],
            dry_run: false,
            verbose: 0,
        };
        assert!(args.validate().is_ok());

        let mut missing_settings = args.clone();
        missing_settings.settings = temp_dir.path().join("nope.toml");
        assert!(missing_settings.validate().is_err());

        let mut bad_dir = args;
        bad_dir.csv_dir = settings;
        assert!(bad_dir.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), "info");
        assert_eq!(log_level(1), "debug");
        assert_eq!(log_level(5), "trace");
    }
}

//! CSV ingestion pipeline.
//!
//! Loads one yearly survey directory into the store. Files are processed
//! in lexicographically sorted order, one transaction per file; any
//! failure rolls back the current file and aborts the run. Each file
//! covers exactly one postcode area, and its readings wholly replace the
//! stored rows for that (category, year, area).

pub mod headers;
pub mod row;

use crate::cache::{DimensionCache, DimensionKind};
use crate::category::Category;
use crate::store::{ReadingRow, Store};
use crate::{Error, Result};
use headers::HeaderPlan;
use row::{ColumnIndexes, FileAccumulator, RowOutcome, parse_row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Ingestion job options
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Target survey year
    pub year: i32,
    /// Directory scanned non-recursively for `*.csv` files
    pub input_dir: PathBuf,
    /// Configured column headers
    pub headers: HeaderPlan,
    /// Compute and log intended changes without persisting anything
    pub dry_run: bool,
}

/// Counters reported after a run.
///
/// A dry run produces the same counts a wet run would have committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// CSV files processed
    pub files_processed: usize,
    /// Data rows read across all files
    pub rows_read: usize,
    /// New postcode areas created
    pub new_areas: usize,
    /// New postcode districts created
    pub new_districts: usize,
    /// New postcode units created
    pub new_units: usize,
    /// Stale reading rows deleted across all categories
    pub entries_deleted: usize,
    /// Reading rows written across all categories
    pub entries_written: usize,
}

/// Validate a target year argument: exactly four ASCII digits, year 1
/// or later
pub fn validate_year(value: &str) -> Result<i32> {
    if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
        match value.parse() {
            Ok(year) if year > 0 => Ok(year),
            _ => Err(Error::invalid_year(value)),
        }
    } else {
        Err(Error::invalid_year(value))
    }
}

/// One-shot ingestion pipeline over a store and the shared dimension cache
#[derive(Debug)]
pub struct Pipeline<'a> {
    store: &'a Store,
    cache: &'a DimensionCache,
    options: IngestOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a Store, cache: &'a DimensionCache, options: IngestOptions) -> Self {
        Self {
            store,
            cache,
            options,
        }
    }

    /// Run the ingestion job over every `*.csv` file in the input
    /// directory, in sorted order. Fail-fast: the first error aborts the
    /// run; earlier files stay committed.
    ///
    /// A dry run does all of its work inside a single transaction that
    /// is rolled back at the end. Reads on the same connection still see
    /// the pending rows, so later files resolve dimensions created by
    /// earlier ones and the counters match a wet run exactly.
    pub fn run(&self) -> Result<IngestStats> {
        let mut stats = IngestStats::default();

        if self.options.dry_run {
            self.store.begin()?;
        }
        let outcome = self.process_files(&mut stats);
        if self.options.dry_run {
            info!("Dry run: discarding all changes");
            let _ = self.store.rollback();
            self.cache.clear();
        }
        outcome?;

        info!(
            "Ingestion done: {} files, {} rows, {} new areas, {} new districts, {} new units, \
             {} entries deleted, {} entries written{}",
            stats.files_processed,
            stats.rows_read,
            stats.new_areas,
            stats.new_districts,
            stats.new_units,
            stats.entries_deleted,
            stats.entries_written,
            if self.options.dry_run {
                " (dry run, nothing persisted)"
            } else {
                ""
            }
        );
        Ok(stats)
    }

    fn process_files(&self, stats: &mut IngestStats) -> Result<()> {
        for path in self.csv_files()? {
            self.process_file(&path, stats)?;
            stats.files_processed += 1;
        }
        Ok(())
    }

    fn csv_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.options.input_dir.join("*.csv");
        let pattern = pattern
            .to_str()
            .ok_or_else(|| Error::configuration("Input directory is not valid UTF-8"))?;

        let mut files: Vec<PathBuf> = glob::glob(pattern)
            .map_err(|e| Error::configuration(format!("Invalid input directory: {e}")))?
            .filter_map(|entry| entry.ok())
            .collect();
        files.sort();

        if files.is_empty() {
            warn!(
                "No csv files found in {}",
                self.options.input_dir.display()
            );
        }
        Ok(files)
    }

    /// Process one file as a single atomic unit
    fn process_file(&self, path: &Path, stats: &mut IngestStats) -> Result<()> {
        info!("Loading file {}", path.display());
        let file_name = path.display().to_string();

        let file = std::fs::File::open(path)
            .map_err(|e| Error::io(format!("Failed to open {file_name}"), e))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .quote(b'"')
            .has_headers(true)
            .from_reader(file);

        let header_row = reader
            .headers()
            .map_err(|e| {
                Error::csv_parsing(file_name.as_str(), "Failed to read csv headers", Some(e))
            })?
            .clone();
        let columns = ColumnIndexes::locate(&header_row, &self.options.headers, &file_name)?;

        let mut accumulator = FileAccumulator::new();
        for (row_index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                Error::csv_parsing(
                    file_name.as_str(),
                    format!("Failed to read row {row_index}"),
                    Some(e),
                )
            })?;
            stats.rows_read += 1;

            match parse_row(&record, &columns, row_index) {
                RowOutcome::Accepted(row) => {
                    if let Err(found) = accumulator.absorb(row) {
                        return Err(Error::AreaMismatch {
                            file: file_name,
                            row: row_index,
                            expected: accumulator.area.clone().unwrap_or_default(),
                            found,
                        });
                    }
                }
                RowOutcome::Rejected(rejection) => {
                    return Err(Error::InvalidRowPostcode {
                        postcode: rejection.postcode,
                        file: file_name,
                        row: rejection.row,
                    });
                }
            }
        }

        let Some(area) = accumulator.area.clone() else {
            warn!("No data rows in {file_name}");
            return Ok(());
        };

        if self.options.dry_run {
            // Inside the run-long transaction opened by `run`
            self.apply(&area, &accumulator, stats)?;
            self.cache.clear();
            return Ok(());
        }

        self.store.begin()?;
        match self.apply(&area, &accumulator, stats) {
            Ok(()) => {
                info!("Committing {file_name}");
                self.store.commit()?;
                // New dimension rows must be visible to later files
                // and to the query side
                self.cache.clear();
                Ok(())
            }
            Err(error) => {
                let _ = self.store.rollback();
                Err(error)
            }
        }
    }

    /// Reconcile dimensions and replace readings inside the current
    /// transaction
    fn apply(&self, area: &str, accumulator: &FileAccumulator, stats: &mut IngestStats) -> Result<()> {
        let year = self.options.year;

        let area_id = match self.cache.resolve(self.store, DimensionKind::Area, area)? {
            Some(id) => id,
            None => {
                info!("Adding new postcode area '{area}'");
                stats.new_areas += 1;
                self.store.insert_area(area)?
            }
        };

        let mut district_ids: HashMap<&str, i64> = HashMap::new();
        let mut new_districts = 0;
        for district in &accumulator.districts {
            let id = match self
                .cache
                .resolve(self.store, DimensionKind::District, district)?
            {
                Some(id) => id,
                None => {
                    new_districts += 1;
                    self.store.insert_district(district)?
                }
            };
            district_ids.insert(district.as_str(), id);
        }
        if new_districts > 0 {
            info!("Adding {new_districts} new postcode districts");
            stats.new_districts += new_districts;
        }

        let mut unit_ids: HashMap<&str, i64> = HashMap::new();
        let mut new_units = 0;
        for unit in &accumulator.units {
            let id = match self.cache.resolve(self.store, DimensionKind::Unit, unit)? {
                Some(id) => id,
                None => {
                    new_units += 1;
                    self.store.insert_unit(unit)?
                }
            };
            unit_ids.insert(unit.as_str(), id);
        }
        if new_units > 0 {
            info!("Adding {new_units} new postcode units");
            stats.new_units += new_units;
        }

        // Readings for this (year, area) are wholly replaced
        for category in Category::ALL {
            let deleted = self.store.delete_readings(category, year, area_id)?;
            if deleted > 0 {
                debug!(
                    "Deleted {deleted} old entries from table {} for year {year}",
                    category.table()
                );
            }
            stats.entries_deleted += deleted;
        }

        for (key, readings) in &accumulator.entries {
            for category in Category::ALL {
                let reading = &readings[category.index()];
                if reading.is_empty() {
                    continue;
                }

                self.store.insert_reading(
                    category,
                    &ReadingRow {
                        year,
                        area_id,
                        district_id: district_ids[key.district.as_str()],
                        sector: key.sector.clone(),
                        unit_id: unit_ids[key.unit.as_str()],
                        download: reading.download,
                        upload: reading.upload,
                    },
                )?;
                stats.entries_written += 1;
            }
        }

        Ok(())
    }
}

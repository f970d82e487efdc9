//! Row parsing and per-file accumulation.
//!
//! Each CSV data row either parses into a [`RowReadings`] or is rejected
//! outright; the outcome is data the pipeline aggregates, not control
//! flow. A speed cell that fails numeric conversion is "no reading"
//! inside an accepted row, never a rejection.

use crate::constants::CATEGORY_COUNT;
use crate::ingest::headers::HeaderPlan;
use crate::postcode::Postcode;
use crate::{Error, Result};
use csv::StringRecord;
use std::collections::{BTreeMap, BTreeSet};

/// Column positions of the configured headers within one file
#[derive(Debug, Clone)]
pub struct ColumnIndexes {
    pub postcode: usize,
    pub download: [usize; CATEGORY_COUNT],
    pub upload: [usize; CATEGORY_COUNT],
}

impl ColumnIndexes {
    /// Locate every configured header in a file's header row.
    ///
    /// Fails when any configured header is absent, listing all the
    /// missing names at once.
    pub fn locate(headers: &StringRecord, plan: &HeaderPlan, file: &str) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let mut missing: Vec<&str> = plan.all().filter(|&h| position(h).is_none()).collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(Error::MissingHeaders {
                file: file.to_string(),
                headers: missing
                    .iter()
                    .map(|h| format!("'{h}'"))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let located = |name: &String| position(name).expect("checked above");
        Ok(Self {
            postcode: located(&plan.postcode),
            download: std::array::from_fn(|i| located(&plan.download[i])),
            upload: std::array::from_fn(|i| located(&plan.upload[i])),
        })
    }
}

/// One download/upload pair; `None` means "no reading"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedReading {
    pub download: Option<f64>,
    pub upload: Option<f64>,
}

impl SpeedReading {
    /// Whether neither direction holds a value
    pub fn is_empty(&self) -> bool {
        self.download.is_none() && self.upload.is_none()
    }
}

/// One successfully parsed data row
#[derive(Debug, Clone)]
pub struct RowReadings {
    pub postcode: Postcode,
    /// Per-category readings in registry order
    pub readings: [SpeedReading; CATEGORY_COUNT],
}

/// A row the pipeline must reject: its postcode did not parse
#[derive(Debug, Clone)]
pub struct RowRejection {
    pub row: usize,
    pub postcode: String,
}

/// Outcome of parsing one data row
#[derive(Debug, Clone)]
pub enum RowOutcome {
    Accepted(RowReadings),
    Rejected(RowRejection),
}

/// Parse one data row against the located columns
pub fn parse_row(record: &StringRecord, columns: &ColumnIndexes, row_index: usize) -> RowOutcome {
    let raw_postcode = record.get(columns.postcode).unwrap_or("");

    let Some(postcode) = Postcode::parse(raw_postcode) else {
        return RowOutcome::Rejected(RowRejection {
            row: row_index,
            postcode: raw_postcode.to_string(),
        });
    };

    let cell = |index: usize| -> Option<f64> {
        record.get(index).and_then(|v| v.trim().parse().ok())
    };

    let readings = std::array::from_fn(|i| SpeedReading {
        download: cell(columns.download[i]),
        upload: cell(columns.upload[i]),
    });

    RowOutcome::Accepted(RowReadings { postcode, readings })
}

/// Logical reading key within one file's postcode area
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EntryKey {
    pub district: String,
    pub sector: String,
    pub unit: String,
}

/// Accepted rows accumulated for one file.
///
/// The first row fixes the file's postcode area; later rows must agree.
/// Repeated keys overwrite earlier values, so the last row wins.
#[derive(Debug, Default)]
pub struct FileAccumulator {
    /// Postcode area shared by every row of the file, set by the first row
    pub area: Option<String>,
    /// District codes referenced by any entry
    pub districts: BTreeSet<String>,
    /// Unit codes referenced by any entry
    pub units: BTreeSet<String>,
    /// Per-key readings, last row wins
    pub entries: BTreeMap<EntryKey, [SpeedReading; CATEGORY_COUNT]>,
}

impl FileAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one accepted row. Returns the conflicting area when the
    /// row's area differs from the file's established area.
    pub fn absorb(&mut self, row: RowReadings) -> std::result::Result<(), String> {
        match &self.area {
            Some(area) if *area != row.postcode.area => return Err(row.postcode.area),
            Some(_) => {}
            None => self.area = Some(row.postcode.area.clone()),
        }

        self.districts.insert(row.postcode.district.clone());
        self.units.insert(row.postcode.unit.clone());
        self.entries.insert(
            EntryKey {
                district: row.postcode.district,
                sector: row.postcode.sector,
                unit: row.postcode.unit,
            },
            row.readings,
        );
        Ok(())
    }
}

//! Average lookup service.
//!
//! Resolves a postcode and a connection-category filter to the most
//! recent stored readings, going through the dimension cache. A postcode
//! fragment missing from the dimensions is a legitimate "no data"
//! outcome, not an error.

use crate::cache::{DimensionCache, DimensionKind};
use crate::category::Category;
use crate::postcode::Postcode;
use crate::store::Store;
use crate::{Error, Result};
use tracing::debug;

/// One per-category result
#[derive(Debug, Clone, PartialEq)]
pub struct Average {
    /// Friendly connection name
    pub connection: &'static str,
    pub download: Option<f64>,
    pub upload: Option<f64>,
}

/// Lenient query result: results plus a human-readable message.
///
/// `message` is empty on success and explains the empty result otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageSummary {
    pub results: Vec<Average>,
    pub message: String,
}

/// Read-only query service over the store and the shared dimension cache
#[derive(Debug)]
pub struct AverageQueryService<'a> {
    store: &'a Store,
    cache: &'a DimensionCache,
}

impl<'a> AverageQueryService<'a> {
    pub fn new(store: &'a Store, cache: &'a DimensionCache) -> Self {
        Self { store, cache }
    }

    /// Get the most recent averages for a postcode, filtered by
    /// connection name (`"all"` selects every category).
    ///
    /// Strict mode: an unparsable postcode or unknown connection name is
    /// an error. A postcode whose area, district or unit is absent from
    /// the dimensions yields an empty list without touching the reading
    /// tables. Categories with no stored reading are omitted.
    pub fn get_averages(&self, postcode: &str, connection: &str) -> Result<Vec<Average>> {
        let parsed =
            Postcode::parse(postcode).ok_or_else(|| Error::invalid_postcode(postcode))?;

        let Some(ids) = self.resolve_dimensions(&parsed)? else {
            debug!("Unknown postcode fragment for {parsed}, returning no results");
            return Ok(Vec::new());
        };

        let categories = Category::expand_connection(connection)?;
        self.fetch(&categories, ids, &parsed.sector)
    }

    /// Lenient variant used by human-facing summaries: invalid input
    /// becomes a message rather than an error.
    pub fn get_averages_lenient(&self, postcode: &str, connection: &str) -> Result<AverageSummary> {
        let mut message = "No results.";
        let mut results = Vec::new();

        if let Some(parsed) = Postcode::parse(postcode) {
            if let Some(ids) = self.resolve_dimensions(&parsed)? {
                match Category::expand_connection(connection) {
                    Ok(categories) => {
                        results = self.fetch(&categories, ids, &parsed.sector)?;
                    }
                    Err(Error::InvalidConnection { .. }) => message = "Invalid connection.",
                    Err(error) => return Err(error),
                }
            }
        } else {
            message = "Invalid postal code.";
        }

        Ok(AverageSummary {
            message: if results.is_empty() {
                message.to_string()
            } else {
                String::new()
            },
            results,
        })
    }

    /// Resolve the three dimension ids, or `None` when any is unknown
    fn resolve_dimensions(&self, postcode: &Postcode) -> Result<Option<(i64, i64, i64)>> {
        let area = self
            .cache
            .resolve(self.store, DimensionKind::Area, &postcode.area)?;
        let district =
            self.cache
                .resolve(self.store, DimensionKind::District, &postcode.district)?;
        let unit = self
            .cache
            .resolve(self.store, DimensionKind::Unit, &postcode.unit)?;

        match (area, district, unit) {
            (Some(area_id), Some(district_id), Some(unit_id)) => {
                Ok(Some((area_id, district_id, unit_id)))
            }
            _ => Ok(None),
        }
    }

    fn fetch(
        &self,
        categories: &[Category],
        (area_id, district_id, unit_id): (i64, i64, i64),
        sector: &str,
    ) -> Result<Vec<Average>> {
        let mut results = Vec::new();
        for &category in categories {
            if let Some((download, upload)) =
                self.store
                    .latest_reading(category, area_id, district_id, sector, unit_id)?
            {
                results.push(Average {
                    connection: category.connection_name(),
                    download,
                    upload,
                });
            }
        }
        Ok(results)
    }
}

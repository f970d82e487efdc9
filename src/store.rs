//! SQLite-backed relational store.
//!
//! Owns the database connection and the dimensional schema: three
//! postcode dimension tables (area/district/unit, each with a unique
//! code index) and one reading table per connection category. The
//! ingestion pipeline is the only writer; the query service only reads.

use crate::category::Category;
use crate::{Result, Settings};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::debug;

/// One reading row ready for insertion, with dimension ids resolved
#[derive(Debug, Clone)]
pub struct ReadingRow {
    pub year: i32,
    pub area_id: i64,
    pub district_id: i64,
    /// Single sector digit, stored on the row rather than dimensionalized
    pub sector: String,
    pub unit_id: i64,
    pub download: Option<f64>,
    pub upload: Option<f64>,
}

/// Relational store over a SQLite database
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the database named by the settings file
    pub fn open(settings: &Settings) -> Result<Self> {
        Self::open_path(&settings.database.path)
    }

    /// Open a database at an explicit path
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Create the dimension and reading tables if they do not exist.
    ///
    /// Reading tables carry no uniqueness constraint on the logical key;
    /// at-most-one row per (category, year, area, district, sector, unit)
    /// is guaranteed by the ingestion pipeline's replace algorithm.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS postcode_areas (
                 id INTEGER PRIMARY KEY,
                 area TEXT NOT NULL
             );
             CREATE UNIQUE INDEX IF NOT EXISTS area_idx ON postcode_areas (area);

             CREATE TABLE IF NOT EXISTS postcode_districts (
                 id INTEGER PRIMARY KEY,
                 district TEXT NOT NULL
             );
             CREATE UNIQUE INDEX IF NOT EXISTS district_idx ON postcode_districts (district);

             CREATE TABLE IF NOT EXISTS postcode_units (
                 id INTEGER PRIMARY KEY,
                 unit TEXT NOT NULL
             );
             CREATE UNIQUE INDEX IF NOT EXISTS unit_idx ON postcode_units (unit);",
        )?;

        for category in Category::ALL {
            self.conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                     id INTEGER PRIMARY KEY,
                     year INTEGER NOT NULL,
                     postcode_area_id INTEGER NOT NULL
                         REFERENCES postcode_areas (id),
                     postcode_district_id INTEGER NOT NULL
                         REFERENCES postcode_districts (id),
                     postcode_sector TEXT NOT NULL,
                     postcode_unit_id INTEGER NOT NULL
                         REFERENCES postcode_units (id),
                     download REAL,
                     upload REAL
                 );",
                table = category.table()
            ))?;
        }

        debug!("Schema ensured");
        Ok(())
    }

    // ---- transactions -----------------------------------------------

    /// Begin a transaction
    pub fn begin(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Commit the current transaction
    pub fn commit(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Roll back the current transaction
    pub fn rollback(&self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    // ---- dimension reads --------------------------------------------

    /// Load the full postcode area dimension as (code, id) pairs
    pub fn load_areas(&self) -> Result<Vec<(String, i64)>> {
        self.load_dimension("SELECT area, id FROM postcode_areas")
    }

    /// Load the full postcode district dimension as (code, id) pairs
    pub fn load_districts(&self) -> Result<Vec<(String, i64)>> {
        self.load_dimension("SELECT district, id FROM postcode_districts")
    }

    /// Load the full postcode unit dimension as (code, id) pairs
    pub fn load_units(&self) -> Result<Vec<(String, i64)>> {
        self.load_dimension("SELECT unit, id FROM postcode_units")
    }

    fn load_dimension(&self, sql: &str) -> Result<Vec<(String, i64)>> {
        let mut statement = self.conn.prepare(sql)?;
        let rows = statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ---- dimension writes -------------------------------------------

    /// Insert a new postcode area and return its generated id
    pub fn insert_area(&self, area: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO postcode_areas (area) VALUES (?1)",
            params![area],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a new postcode district and return its generated id
    pub fn insert_district(&self, district: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO postcode_districts (district) VALUES (?1)",
            params![district],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a new postcode unit and return its generated id
    pub fn insert_unit(&self, unit: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO postcode_units (unit) VALUES (?1)",
            params![unit],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ---- reading writes ---------------------------------------------

    /// Delete every reading for (year, area) in one category's table,
    /// returning the number of rows removed
    pub fn delete_readings(&self, category: Category, year: i32, area_id: i64) -> Result<usize> {
        let deleted = self.conn.execute(
            &format!(
                "DELETE FROM {table} WHERE year = ?1 AND postcode_area_id = ?2",
                table = category.table()
            ),
            params![year, area_id],
        )?;
        Ok(deleted)
    }

    /// Insert one reading row into a category's table
    pub fn insert_reading(&self, category: Category, reading: &ReadingRow) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {table}
                     (year, postcode_area_id, postcode_district_id,
                      postcode_sector, postcode_unit_id, download, upload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                table = category.table()
            ),
            params![
                reading.year,
                reading.area_id,
                reading.district_id,
                reading.sector,
                reading.unit_id,
                reading.download,
                reading.upload,
            ],
        )?;
        Ok(())
    }

    // ---- reading reads ----------------------------------------------

    /// Fetch the most recent (download, upload) reading for an exact
    /// (area, district, sector, unit) tuple in one category's table
    pub fn latest_reading(
        &self,
        category: Category,
        area_id: i64,
        district_id: i64,
        sector: &str,
        unit_id: i64,
    ) -> Result<Option<(Option<f64>, Option<f64>)>> {
        let reading = self
            .conn
            .query_row(
                &format!(
                    "SELECT download, upload FROM {table}
                     WHERE postcode_area_id = ?1
                       AND postcode_district_id = ?2
                       AND postcode_sector = ?3
                       AND postcode_unit_id = ?4
                     ORDER BY year DESC
                     LIMIT 1",
                    table = category.table()
                ),
                params![area_id, district_id, sector, unit_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(reading)
    }

    /// Count the rows in one category's reading table, used by tests and
    /// run summaries
    pub fn count_readings(&self, category: Category) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {table}", table = category.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn test_dimension_insert_and_load() {
        let store = store();

        let ab = store.insert_area("AB").unwrap();
        let cd = store.insert_area("CD").unwrap();
        assert_ne!(ab, cd);

        let mut areas = store.load_areas().unwrap();
        areas.sort();
        assert_eq!(areas, vec![("AB".to_string(), ab), ("CD".to_string(), cd)]);
    }

    #[test]
    fn test_dimension_codes_are_unique() {
        let store = store();
        store.insert_unit("AU").unwrap();
        assert!(store.insert_unit("AU").is_err());
    }

    #[test]
    fn test_reading_round_trip_and_replacement() {
        let store = store();
        let area_id = store.insert_area("AB").unwrap();
        let district_id = store.insert_district("10").unwrap();
        let unit_id = store.insert_unit("AU").unwrap();

        let reading = ReadingRow {
            year: 2020,
            area_id,
            district_id,
            sector: "1".to_string(),
            unit_id,
            download: Some(45.5),
            upload: Some(9.1),
        };
        store.insert_reading(Category::Average, &reading).unwrap();

        let found = store
            .latest_reading(Category::Average, area_id, district_id, "1", unit_id)
            .unwrap();
        assert_eq!(found, Some((Some(45.5), Some(9.1))));

        let deleted = store
            .delete_readings(Category::Average, 2020, area_id)
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count_readings(Category::Average).unwrap(), 0);
    }

    #[test]
    fn test_latest_reading_prefers_highest_year() {
        let store = store();
        let area_id = store.insert_area("AB").unwrap();
        let district_id = store.insert_district("10").unwrap();
        let unit_id = store.insert_unit("AU").unwrap();

        for (year, download) in [(2019, 20.0), (2021, 60.0), (2020, 40.0)] {
            store
                .insert_reading(
                    Category::Sfbb,
                    &ReadingRow {
                        year,
                        area_id,
                        district_id,
                        sector: "1".to_string(),
                        unit_id,
                        download: Some(download),
                        upload: None,
                    },
                )
                .unwrap();
        }

        let found = store
            .latest_reading(Category::Sfbb, area_id, district_id, "1", unit_id)
            .unwrap();
        assert_eq!(found, Some((Some(60.0), None)));
    }

    #[test]
    fn test_rollback_discards_writes() {
        let store = store();
        store.begin().unwrap();
        store.insert_area("ZZ").unwrap();
        store.rollback().unwrap();
        assert!(store.load_areas().unwrap().is_empty());
    }
}

//! In-memory cache over the postcode dimension tables.
//!
//! Dimension cardinality is small (bounded by UK postcode structure), so
//! the cache loads each dimension table wholesale on first resolution and
//! serves every later lookup from memory. New dimension rows written by
//! ingestion only become visible after an explicit [`DimensionCache::clear`];
//! there is no incremental invalidation.

use crate::{Result, Store};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// The three postcode dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Area,
    District,
    Unit,
}

#[derive(Debug, Default)]
struct DimensionMaps {
    areas: HashMap<String, i64>,
    districts: HashMap<String, i64>,
    units: HashMap<String, i64>,
}

/// Lazily-populated map from dimension code to generated id.
///
/// Shared between the ingestion pipeline and the query service. The lazy
/// populate path is synchronized: concurrent first resolutions perform a
/// single load under the lock.
#[derive(Debug, Default)]
pub struct DimensionCache {
    maps: Mutex<Option<DimensionMaps>>,
}

impl DimensionCache {
    /// Create an empty, unpopulated cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a dimension code to its id, or `None` when the code has no
    /// row. The first resolution loads all three dimension tables.
    pub fn resolve(&self, store: &Store, kind: DimensionKind, code: &str) -> Result<Option<i64>> {
        let mut guard = self.maps.lock().expect("dimension cache lock poisoned");

        if guard.is_none() {
            *guard = Some(Self::load(store)?);
        }

        let maps = guard.as_ref().expect("cache populated above");
        let id = match kind {
            DimensionKind::Area => maps.areas.get(code),
            DimensionKind::District => maps.districts.get(code),
            DimensionKind::Unit => maps.units.get(code),
        };
        Ok(id.copied())
    }

    /// Eagerly populate the cache, replacing any previous contents
    pub fn warm_up(&self, store: &Store) -> Result<()> {
        let maps = Self::load(store)?;
        *self.maps.lock().expect("dimension cache lock poisoned") = Some(maps);
        Ok(())
    }

    /// Discard all cached state so the next resolution reloads from the
    /// store, making newly created dimension rows visible
    pub fn clear(&self) {
        *self.maps.lock().expect("dimension cache lock poisoned") = None;
    }

    fn load(store: &Store) -> Result<DimensionMaps> {
        let maps = DimensionMaps {
            areas: store.load_areas()?.into_iter().collect(),
            districts: store.load_districts()?.into_iter().collect(),
            units: store.load_units()?.into_iter().collect(),
        };
        debug!(
            "Loaded dimension cache: {} areas, {} districts, {} units",
            maps.areas.len(),
            maps.districts.len(),
            maps.units.len()
        );
        Ok(maps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown_codes() {
        let store = Store::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        let area_id = store.insert_area("AB").unwrap();

        let cache = DimensionCache::new();
        assert_eq!(
            cache
                .resolve(&store, DimensionKind::Area, "AB")
                .unwrap(),
            Some(area_id)
        );
        assert_eq!(
            cache.resolve(&store, DimensionKind::Area, "ZZ").unwrap(),
            None
        );
        assert_eq!(
            cache.resolve(&store, DimensionKind::Unit, "AU").unwrap(),
            None
        );
    }

    #[test]
    fn test_new_rows_are_invisible_until_clear() {
        let store = Store::open_in_memory().unwrap();
        store.ensure_schema().unwrap();

        let cache = DimensionCache::new();
        // Populate on an empty store
        assert_eq!(
            cache.resolve(&store, DimensionKind::District, "10").unwrap(),
            None
        );

        let district_id = store.insert_district("10").unwrap();

        // Still served from the stale snapshot
        assert_eq!(
            cache.resolve(&store, DimensionKind::District, "10").unwrap(),
            None
        );

        cache.clear();
        assert_eq!(
            cache.resolve(&store, DimensionKind::District, "10").unwrap(),
            Some(district_id)
        );
    }

    #[test]
    fn test_warm_up_replaces_previous_contents() {
        let store = Store::open_in_memory().unwrap();
        store.ensure_schema().unwrap();

        let cache = DimensionCache::new();
        cache.warm_up(&store).unwrap();

        let unit_id = store.insert_unit("AU").unwrap();
        cache.warm_up(&store).unwrap();

        assert_eq!(
            cache.resolve(&store, DimensionKind::Unit, "AU").unwrap(),
            Some(unit_id)
        );
    }
}
